use jiff::SpanRelativeTo;

/// Accepts ISO 8601 durations, friendly spans ("1m 30s") and plain seconds ("90", "2.5").
pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    if let Ok(seconds) = input.parse::<f64>() {
        if seconds.is_finite() {
            return jiff::SignedDuration::try_from_secs_f64(seconds.abs())
                .map_err(|error| error.to_string());
        }
    }

    Err(String::from("Invalid duration"))
}
