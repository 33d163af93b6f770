use axum::response::Html;

/// GET /
/// The input form. Each button submits a different `action`.
pub async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html><html><body>
<form action="/gen_strokes" method="post">
<p>Characters: <input type="text" name="chars" value="你好"/></p>
<p>Size: <input type="text" name="size" value="15"/></p>
<p>Number of repetitions. 0 means "no repetitions"; useful if you're
    just trying to quickly get familiar with many characters:
    <input type="text" name="nr" value="1"/></p>
<p><label><input type="checkbox" name="hints" value="1"/>
    Show pronunciation on recall tiles</label></p>
<button type="submit" value="generate" name="action">Generate (PDF, slow)</button>
<button type="submit" value="preview_small" name="action">Preview (SVG, zoomed out)</button>
<button type="submit" value="preview_large" name="action">Preview (SVG, zoomed in)</button>
</form>
</body></html>"#,
    )
}
