use html_escape::encode_double_quoted_attribute;
use serde::Serialize;

pub const DEFAULT_PREVIEW_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RenderConfig {
    pub preview_size: u32,
    pub use_table_wrapper: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preview_size: DEFAULT_PREVIEW_SIZE,
            use_table_wrapper: true,
        }
    }
}

/// Builds the copy-pasteable embed HTML for one image url. An empty url
/// yields an empty string.
pub fn generate_snippet(url: &str, config: &RenderConfig) -> String {
    if url.is_empty() {
        return String::new();
    }

    let size = config.preview_size;
    let img_tag = format!(
        "<img src=\"{}\" height=\"{size}\" width=\"{size}\">",
        encode_double_quoted_attribute(url)
    );
    if config.use_table_wrapper {
        format!("<table><tr><td>{img_tag}</td></tr></table>")
    } else {
        img_tag
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_snippet, RenderConfig};

    #[test]
    fn empty_url_yields_empty_snippet() {
        let bare = RenderConfig {
            preview_size: 100,
            use_table_wrapper: false,
        };
        let wrapped = RenderConfig {
            preview_size: 100,
            use_table_wrapper: true,
        };
        assert_eq!(generate_snippet("", &bare), "");
        assert_eq!(generate_snippet("", &wrapped), "");
    }

    #[test]
    fn bare_img_tag_uses_preview_size_for_both_dimensions() {
        let config = RenderConfig {
            preview_size: 100,
            use_table_wrapper: false,
        };
        assert_eq!(
            generate_snippet("http://x/a.png", &config),
            "<img src=\"http://x/a.png\" height=\"100\" width=\"100\">"
        );
    }

    #[test]
    fn table_wrapper_surrounds_the_img_tag() {
        let config = RenderConfig {
            preview_size: 50,
            use_table_wrapper: true,
        };
        assert_eq!(
            generate_snippet("http://x/a.png", &config),
            "<table><tr><td><img src=\"http://x/a.png\" height=\"50\" width=\"50\"></td></tr></table>"
        );
    }

    #[test]
    fn url_is_escaped_for_the_src_attribute() {
        let config = RenderConfig {
            preview_size: 10,
            use_table_wrapper: false,
        };
        assert_eq!(
            generate_snippet("http://x/a\".png", &config),
            "<img src=\"http://x/a&quot;.png\" height=\"10\" width=\"10\">"
        );
    }
}
