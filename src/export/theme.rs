//! Stylesheets for exported pages.

use std::path::Path;

use super::render::RenderError;

/// Default light theme CSS.
pub const THEME_DEFAULT: &str = r#"
body {
    font-family: system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    max-width: 800px;
    margin: 0 auto;
    padding: 2rem;
    color: #333;
}
h1 { border-bottom: 1px solid #eee; padding-bottom: 0.5rem; }
h1, h2, h3, h4, h5, h6 { margin-top: 1.5em; margin-bottom: 0.5em; }
a { color: #0066cc; text-decoration: none; }
a:hover { text-decoration: underline; }
pre { background: #f5f5f5; padding: 1rem; overflow-x: auto; border-radius: 4px; }
code { font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace; font-size: 0.9em; }
:not(pre) > code { background: #f0f0f0; padding: 0.1rem 0.3rem; border-radius: 3px; }
blockquote { border-left: 3px solid #ddd; margin-left: 0; padding-left: 1rem; color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 0.5rem; text-align: left; }
th { background: #f5f5f5; }
img { max-width: 100%; height: auto; }
nav.outline {
    position: fixed;
    top: 2rem;
    left: 1rem;
    width: 14rem;
    max-height: 80vh;
    overflow-y: auto;
    font-size: 0.85em;
}
nav.outline ul { list-style: none; padding-left: 0; margin: 0; }
nav.outline li { margin: 0.2rem 0; }
nav.outline .outline-h2 { padding-left: 0.8rem; }
nav.outline .outline-h3 { padding-left: 1.6rem; }
nav.outline .outline-h4, nav.outline .outline-h5, nav.outline .outline-h6 { padding-left: 2.4rem; }
@media (max-width: 1200px) { nav.outline { position: static; width: auto; max-height: none; } }
@media print { nav.outline { display: none; } }
.metadata { color: #666; font-size: 0.9em; margin-top: 2rem; }
"#;

/// Dark theme CSS.
pub const THEME_DARK: &str = r#"
body {
    font-family: system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    max-width: 800px;
    margin: 0 auto;
    padding: 2rem;
    background: #1a1a1a;
    color: #e0e0e0;
}
h1 { border-bottom: 1px solid #333; padding-bottom: 0.5rem; }
h1, h2, h3, h4, h5, h6 { margin-top: 1.5em; margin-bottom: 0.5em; }
a { color: #6af; text-decoration: none; }
a:hover { text-decoration: underline; }
pre { background: #2a2a2a; padding: 1rem; overflow-x: auto; border-radius: 4px; }
code { font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace; font-size: 0.9em; }
:not(pre) > code { background: #333; padding: 0.1rem 0.3rem; border-radius: 3px; }
blockquote { border-left: 3px solid #444; margin-left: 0; padding-left: 1rem; color: #aaa; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #444; padding: 0.5rem; text-align: left; }
th { background: #2a2a2a; }
img { max-width: 100%; height: auto; }
nav.outline {
    position: fixed;
    top: 2rem;
    left: 1rem;
    width: 14rem;
    max-height: 80vh;
    overflow-y: auto;
    font-size: 0.85em;
}
nav.outline ul { list-style: none; padding-left: 0; margin: 0; }
nav.outline li { margin: 0.2rem 0; }
nav.outline .outline-h2 { padding-left: 0.8rem; }
nav.outline .outline-h3 { padding-left: 1.6rem; }
nav.outline .outline-h4, nav.outline .outline-h5, nav.outline .outline-h6 { padding-left: 2.4rem; }
@media (max-width: 1200px) { nav.outline { position: static; width: auto; max-height: none; } }
@media print { nav.outline { display: none; } }
.metadata { color: #888; font-size: 0.9em; margin-top: 2rem; }
"#;

/// Gets CSS for the specified theme.
///
/// `theme` is a built-in name ("default", "dark") or a path to a CSS file.
/// `None` selects the default theme.
///
/// # Errors
///
/// Returns an error if the theme name is unknown or the CSS file cannot be read.
pub fn get_theme_css(theme: Option<&str>) -> Result<String, RenderError> {
    match theme {
        None | Some("default") => Ok(THEME_DEFAULT.to_string()),
        Some("dark") => Ok(THEME_DARK.to_string()),
        Some(name) => {
            let path = Path::new(name);
            if !path.is_file() {
                return Err(RenderError::UnknownTheme(name.to_string()));
            }
            std::fs::read_to_string(path).map_err(|source| RenderError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}
