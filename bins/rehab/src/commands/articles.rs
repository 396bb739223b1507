//! Article commands

use super::Context;
use crate::output::{cache_marker, emit, Status};
use anyhow::Result;
use owo_colors::OwoColorize;
use rehab_api_client::prelude::ArticleFilters;

/// List articles
pub async fn list(ctx: &Context, filters: &ArticleFilters) -> Result<()> {
    let fetched = ctx.client.articles().list(filters).await?;

    emit(ctx.format, &fetched, |fetched| {
        Status::header(&format!("Articles ({} total)", fetched.data.pagination.total));
        for article in &fetched.data.items {
            println!(
                "{:>6}  {}  {}",
                article.id.dimmed(),
                article.title,
                article.published_at.as_deref().unwrap_or("").dimmed()
            );
        }
        println!("{}", cache_marker(fetched.from_cache));
    })
}

/// Show one article
pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let fetched = ctx.client.articles().get(id).await?;

    emit(ctx.format, &fetched, |fetched| {
        let article = &fetched.data;
        Status::header(&article.title);
        if let Some(summary) = &article.summary {
            println!("{summary}");
        }
        for (field, value) in &article.extra {
            println!("  {}: {value}", field.dimmed());
        }
        println!("{}", cache_marker(fetched.from_cache));
    })
}
