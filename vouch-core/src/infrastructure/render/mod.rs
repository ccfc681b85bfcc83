pub mod html;
mod templates;

pub use html::HtmlReportRenderer;
