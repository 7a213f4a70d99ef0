//! Flat view models handed to templates. Templates only see strings and
//! flags; optional CMS fields are resolved here.

use chrono::{DateTime, Utc};

use crate::content::documents::{Category, Comment, Event, Post, TeamMember};
use crate::content::image::ImageUrls;
use crate::content::portable_text;

const EXCERPT_CHARS: usize = 180;
const CARD_IMAGE_WIDTH: u32 = 640;
const HERO_IMAGE_WIDTH: u32 = 1200;
const PORTRAIT_WIDTH: u32 = 320;

pub fn long_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn date_or_blank(date: Option<DateTime<Utc>>) -> String {
    date.map(long_date).unwrap_or_default()
}

pub struct Link {
    pub title: String,
    pub href: String,
}

impl Link {
    pub fn category(title: &str, slug: &str) -> Self {
        Self {
            title: title.to_string(),
            href: format!("/insights/category/{}", slug),
        }
    }
}

impl From<&Category> for Link {
    fn from(category: &Category) -> Self {
        Link::category(&category.title, &category.slug.current)
    }
}

pub struct PostCard {
    pub title: String,
    pub href: String,
    pub date: String,
    pub excerpt: String,
    pub image_url: String,
    pub image_alt: String,
    pub categories: Vec<Link>,
}

impl PostCard {
    pub fn new(post: &Post, images: &ImageUrls) -> Self {
        let excerpt = match post.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => portable_text::plain_text(&post.body, EXCERPT_CHARS),
        };
        let image = post.main_image.as_ref();
        Self {
            title: post.title.clone(),
            href: format!("/insights/{}", post.slug.current),
            date: date_or_blank(post.published_at),
            excerpt,
            image_url: image
                .and_then(|i| images.url_for(i, Some(CARD_IMAGE_WIDTH)))
                .unwrap_or_default(),
            image_alt: image.and_then(|i| i.alt.clone()).unwrap_or_default(),
            categories: post
                .categories
                .iter()
                .map(|c| Link::category(&c.title, &c.slug.current))
                .collect(),
        }
    }
}

pub struct PostView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub date: String,
    pub author: String,
    pub image_url: String,
    pub image_alt: String,
    pub body_html: String,
    pub categories: Vec<Link>,
}

impl PostView {
    pub fn new(post: &Post, images: &ImageUrls) -> Self {
        let image = post.main_image.as_ref();
        Self {
            id: post.id.clone(),
            slug: post.slug.current.clone(),
            title: post.title.clone(),
            date: date_or_blank(post.published_at),
            author: post
                .author
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            image_url: image
                .and_then(|i| images.url_for(i, Some(HERO_IMAGE_WIDTH)))
                .unwrap_or_default(),
            image_alt: image.and_then(|i| i.alt.clone()).unwrap_or_default(),
            body_html: portable_text::render(&post.body, images),
            categories: post
                .categories
                .iter()
                .map(|c| Link::category(&c.title, &c.slug.current))
                .collect(),
        }
    }
}

pub struct CommentView {
    pub name: String,
    pub comment: String,
    pub date: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            name: comment.name.clone(),
            comment: comment.comment.clone(),
            date: date_or_blank(comment.created_at),
        }
    }
}

pub struct EventView {
    pub title: String,
    pub when: String,
    pub location: String,
    pub description: String,
    pub registration_url: String,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        let start = event.starts_at.format("%B %-d, %Y · %H:%M UTC").to_string();
        let when = match event.ends_at {
            Some(end) if end.date_naive() == event.starts_at.date_naive() => {
                format!("{} to {}", start, end.format("%H:%M UTC"))
            }
            Some(end) => format!("{} to {}", start, long_date(end)),
            None => start,
        };
        Self {
            title: event.title.clone(),
            when,
            location: event.location.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
            registration_url: event.registration_url.clone().unwrap_or_default(),
        }
    }
}

pub struct TeamView {
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image_url: String,
}

impl TeamView {
    pub fn new(member: &TeamMember, images: &ImageUrls) -> Self {
        Self {
            name: member.name.clone(),
            role: member.role.clone().unwrap_or_default(),
            bio: member.bio.clone().unwrap_or_default(),
            image_url: member
                .image
                .as_ref()
                .and_then(|i| images.url_for(i, Some(PORTRAIT_WIDTH)))
                .unwrap_or_default(),
        }
    }
}

/// Upcoming events soonest first, past events most recent first.
pub fn split_events(events: &[Event], now: DateTime<Utc>) -> (Vec<EventView>, Vec<EventView>) {
    let (upcoming, mut past): (Vec<&Event>, Vec<&Event>) =
        events.iter().partition(|e| e.is_upcoming(now));
    past.reverse();
    (
        upcoming.into_iter().map(EventView::from).collect(),
        past.into_iter().map(EventView::from).collect(),
    )
}
