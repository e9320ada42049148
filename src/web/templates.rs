//! HTML pages for the catalog.

use maud::{html, Markup, DOCTYPE};

use crate::catalog::Record;

/// Base page layout.
fn base_layout(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="zh-CN" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Product Catalog" }
                link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
            }
            body {
                header class="container" {
                    nav {
                        ul { li { a href="/" { strong { "Product Catalog" } } } }
                    }
                }
                main class="container" { (content) }
            }
        }
    }
}

/// Render text with line breaks preserved.
#[must_use]
pub fn nl2br(text: &str) -> Markup {
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}

/// Render one selling point per non-empty line as a bullet list.
#[must_use]
pub fn format_selling_points(text: &str) -> Markup {
    html! {
        ul {
            @for line in text.trim().lines().map(str::trim).filter(|l| !l.is_empty()) {
                li { (line) }
            }
        }
    }
}

/// Render the catalog listing.
#[must_use]
pub fn render_index(records: &[Record], product_types: &[String], current_filter: &str) -> Markup {
    let content = html! {
        h1 { "Products" }
        form method="get" action="/" {
            select name="product_type" onchange="this.form.submit()" {
                option value="" selected[current_filter.is_empty()] { "All types" }
                @for product_type in product_types {
                    option value=(product_type) selected[product_type == current_filter] {
                        (product_type)
                    }
                }
            }
        }
        @if records.is_empty() {
            p { "No products to show." }
        } @else {
            div class="grid" {
                @for record in records {
                    article {
                        @if !record.image.is_empty() {
                            a href={ "/detail/" (record.record_id) } {
                                img src=(record.image) alt=(record.display_name()) loading="lazy";
                            }
                        }
                        header {
                            a href={ "/detail/" (record.record_id) } { (record.display_name()) }
                        }
                        @if !record.product_type.is_empty() {
                            small { (record.product_type) }
                        }
                    }
                }
            }
        }
    };
    base_layout("Products", &content)
}

/// Render a single record.
#[must_use]
pub fn render_detail(record: &Record) -> Markup {
    let content = html! {
        a href="/" { "← Back" }
        h1 { (record.title) }
        @if !record.title_translation.is_empty() {
            p { (record.title_translation) }
        }
        dl {
            @if !record.product_short_name.is_empty() {
                dt { "Short name" } dd { (record.product_short_name) }
            }
            @if !record.product_type.is_empty() {
                dt { "Type" } dd { (record.product_type) }
            }
            @if !record.asin.is_empty() {
                dt { "ASIN" } dd { (record.asin) }
            }
            @if !record.link.is_empty() {
                dt { "Link" } dd { a href=(record.link) target="_blank" rel="noopener" { (record.link) } }
            }
        }
        @if !record.image.is_empty() {
            img src=(record.image) alt=(record.display_name());
        }
        @if !record.video.is_empty() {
            video controls preload="metadata" src=(record.video) {}
        }
        @if !record.selling_points.is_empty() {
            h2 { "Selling points" }
            (format_selling_points(&record.selling_points))
        }
        @if !record.selling_points_translation.is_empty() {
            h2 { "Selling points (translation)" }
            (format_selling_points(&record.selling_points_translation))
        }
        @if !record.prompt.is_empty() {
            h2 { "Prompt" }
            p { (nl2br(&record.prompt)) }
        }
    };
    base_layout(record.display_name(), &content)
}
