/// Sanitize a rich-text HTML body before it is stored.
///
/// Question and answer content arrives as editor-produced HTML; everything
/// outside ammonia's default allowlist (scripts, event handlers, forms) is
/// stripped server-side so stored content is safe to render as-is.
pub fn sanitize_html(raw: &str) -> String {
    ammonia::clean(raw)
}
