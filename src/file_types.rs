//! Pre-defined file patterns for use in builders like
//! [`compile`](crate::builders::compile).
//!
//! Patterns are regex sources; the downstream tool compiles them.

/// JavaScript sources.
pub const JS: &str = r"\.js$";

/// JSON documents.
pub const JSON: &str = r"\.json$";

/// JSX sources.
pub const JSX: &str = r"\.jsx$";

/// JavaScript or JSX sources.
pub const SCRIPT: &str = r"\.jsx?$";

/// CSS stylesheets.
pub const CSS: &str = r"\.css$";

/// LESS stylesheets.
pub const LESS: &str = r"\.less$";

/// SASS and SCSS stylesheets.
pub const SASS: &str = r"\.s[ac]ss$";

/// Any stylesheet dialect.
pub const STYLESHEET: &str = r"\.(css|less|s[ac]ss)$";

/// Web font files.
pub const FONT: &str = r"\.(svg|eot|otf|ttf|woff2?)$";

/// SVG documents.
pub const SVG: &str = r"\.svg$";

/// Embedded OpenType fonts.
pub const EOT: &str = r"\.eot$";

/// OpenType fonts.
pub const OTF: &str = r"\.otf$";

/// TrueType fonts.
pub const TTF: &str = r"\.ttf$";

/// WOFF and WOFF2 fonts.
pub const WOFF: &str = r"\.woff2?$";

/// PNG images.
pub const PNG: &str = r"\.png\b";

/// GIF images.
pub const GIF: &str = r"\.gif\b";

/// JPEG images.
pub const JPEG: &str = r"\.jpe?g\b";

/// Any supported image format.
pub const IMAGE: &str = r"\.(png|gif|jpe?g|svg)\b";
