use crate::content::documents::ImageAsset;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Parsed form of an asset reference like `image-<id>-<w>x<h>-<format>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub id: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: &'a str,
}

pub fn parse_image_ref(reference: &str) -> Option<ImageRef<'_>> {
    let rest = reference.strip_prefix("image-")?;
    let (rest, format) = rest.rsplit_once('-')?;
    let (id, dims) = rest.rsplit_once('-')?;
    let (w, h) = dims.split_once('x')?;
    if id.is_empty() || format.is_empty() {
        return None;
    }
    Some(ImageRef {
        id,
        width: w.parse().ok()?,
        height: h.parse().ok()?,
        format,
    })
}

/// Maps asset references to CDN URLs. Pure string work; no network.
#[derive(Debug, Clone, Default)]
pub struct ImageUrls {
    project_id: String,
    dataset: String,
}

impl ImageUrls {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn url_for_ref(&self, reference: &str, width: Option<u32>) -> Option<String> {
        let parsed = parse_image_ref(reference)?;
        let mut url = format!(
            "{}/{}/{}/{}-{}x{}.{}",
            CDN_BASE,
            self.project_id,
            self.dataset,
            parsed.id,
            parsed.width,
            parsed.height,
            parsed.format
        );
        if let Some(w) = width {
            url.push_str(&format!("?w={}&auto=format", w));
        }
        Some(url)
    }

    pub fn url_for(&self, image: &ImageAsset, width: Option<u32>) -> Option<String> {
        self.url_for_ref(&image.asset.id, width)
    }
}
