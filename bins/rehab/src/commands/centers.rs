//! Center browsing commands

use super::Context;
use crate::output::{cache_marker, emit, Status};
use anyhow::Result;
use owo_colors::OwoColorize;
use rehab_api_client::prelude::{Center, CenterFilters};

fn center_line(center: &Center) -> String {
    let mut line = format!("{:>6}  {}", center.id.dimmed(), center.name.bold());
    if let Some(city) = &center.city {
        line.push_str(&format!(", {city}"));
    }
    if let Some(kind) = &center.center_type {
        line.push_str(&format!(" [{kind}]"));
    }
    if let Some(rating) = center.rating {
        line.push_str(&format!(" ★ {rating:.1}"));
    }
    line
}

/// List centers
pub async fn list(ctx: &Context, filters: &CenterFilters) -> Result<()> {
    let fetched = ctx.client.centers().list(filters).await?;

    emit(ctx.format, &fetched, |fetched| {
        let page = &fetched.data;
        Status::header(&format!(
            "Centers (page {}/{}, {} total)",
            page.pagination.page, page.pagination.pages, page.pagination.total
        ));
        for center in &page.items {
            println!("{}", center_line(center));
        }
        if page.items.is_empty() {
            Status::info("No centers match these filters");
        }
        println!("{}", cache_marker(fetched.from_cache));
    })
}

/// Show one center
pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let fetched = ctx.client.centers().get(id).await?;

    emit(ctx.format, &fetched, |fetched| {
        println!("{}{}", center_line(&fetched.data), cache_marker(fetched.from_cache));
        for (field, value) in &fetched.data.extra {
            println!("  {}: {value}", field.dimmed());
        }
    })
}

/// Show the reviews of a center
pub async fn reviews(ctx: &Context, id: &str) -> Result<()> {
    let fetched = ctx.client.centers().reviews(id).await?;

    emit(ctx.format, &fetched, |fetched| {
        Status::header(&format!("Reviews of center {id}"));
        for review in &fetched.data.items {
            let stars = "★".repeat(usize::from(review.rating.min(5)));
            println!(
                "{:<5} {}",
                stars.yellow(),
                review.comment.as_deref().unwrap_or("")
            );
        }
        if fetched.data.items.is_empty() {
            Status::info("No reviews yet");
        }
    })
}
