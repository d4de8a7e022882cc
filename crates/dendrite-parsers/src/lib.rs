//! # dendrite-parsers
//!
//! Format-specific parsers producing the Dendrite semantic IR, plus the
//! ordered dispatch that picks one by content type.
//!
//! Four parsers ship by default:
//!
//! - [`MarkdownParser`]: front matter, headings, fenced code, pipe tables,
//!   lists, blockquotes, inline markup
//! - [`HtmlParser`]: DOM walk over `<body>` via `scraper`
//! - [`PlainTextParser`]: UTF-8 text with paragraph detection
//! - [`PdfParser`]: text extraction via `pdf-extract`, page count via `lopdf`
//!
//! Additional formats plug in by implementing
//! [`DocumentParser`](dendrite_core::DocumentParser) and registering ahead of
//! the defaults in [`ParserRegistry`].

pub mod html;
pub mod markdown;
pub mod pdf;
pub mod registry;
pub mod text;

pub use html::HtmlParser;
pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use registry::ParserRegistry;
pub use text::PlainTextParser;
