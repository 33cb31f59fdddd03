// src/dashboard.rs
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::store::PersistedRecipe;

/// Read-only HTML listing of every stored recipe.
pub fn render_dashboard(recipes: &[PersistedRecipe]) -> String {
    let mut rows = String::new();
    for r in recipes {
        let thumb = if r.thumbnail.is_empty() {
            String::from(r#"<span class="no-thumb">-</span>"#)
        } else {
            format!(r#"<img src="{}" alt="" loading="lazy">"#, attr(&r.thumbnail))
        };
        rows.push_str(&format!(
            "<tr><td>{thumb}</td><td><a href=\"{}\">{}</a></td></tr>\n",
            attr(&r.url),
            text(&r.title),
        ));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Recipes</title>
<link rel="stylesheet" href="/assets/dashboard.css">
</head>
<body>
<h1>Recipes <small>({count})</small></h1>
<table>
<thead><tr><th></th><th>Title</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<footer>rendered {now}</footer>
</body>
</html>
"#,
        count = recipes.len(),
        now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
