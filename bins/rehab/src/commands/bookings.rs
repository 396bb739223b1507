//! Booking commands

use super::Context;
use crate::output::{cache_marker, emit, Status};
use anyhow::Result;
use owo_colors::OwoColorize;
use rehab_api_client::prelude::{Booking, NewBooking};

fn booking_line(booking: &Booking) -> String {
    format!(
        "{:>6}  center {}  {}  {}",
        booking.id.dimmed(),
        booking
            .center_id
            .as_ref()
            .map_or_else(|| "?".to_string(), ToString::to_string),
        booking.date.as_deref().unwrap_or("-"),
        booking.status.as_deref().unwrap_or("unknown").cyan()
    )
}

/// List the signed-in user's bookings
pub async fn list(ctx: &Context) -> Result<()> {
    let fetched = ctx.client.bookings().mine().await?;

    emit(ctx.format, &fetched, |fetched| {
        Status::header("Your bookings");
        for booking in &fetched.data.items {
            println!("{}", booking_line(booking));
        }
        if fetched.data.items.is_empty() {
            Status::info("No bookings yet");
        }
        println!("{}", cache_marker(fetched.from_cache));
    })
}

/// Show one booking
pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let fetched = ctx.client.bookings().get(id).await?;

    emit(ctx.format, &fetched, |fetched| {
        println!("{}{}", booking_line(&fetched.data), cache_marker(fetched.from_cache));
    })
}

/// Book a stay
pub async fn create(ctx: &Context, center_id: &str, date: &str, notes: Option<String>) -> Result<()> {
    let mut request = NewBooking::new(center_id, date);
    request.notes = notes;
    let booking = ctx.client.bookings().create(&request).await?;

    emit(ctx.format, &booking, |booking| {
        Status::success(&format!("Booked: {}", booking_line(booking)));
    })
}

/// Cancel a booking
pub async fn cancel(ctx: &Context, id: &str) -> Result<()> {
    let booking = ctx.client.bookings().cancel(id).await?;

    emit(ctx.format, &booking, |booking| {
        Status::success(&format!("Cancelled: {}", booking_line(booking)));
    })
}
