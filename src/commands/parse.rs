//! Argument parsing for the chat command surface.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::ServiceError;

/// Split a command line into tokens. Double quotes group words into a single
/// token so team and league names can contain spaces.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a positive game identifier.
pub fn game_id(token: &str) -> Result<i64, ServiceError> {
    token
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ServiceError::InvalidInput("The game ID must be a positive number.".into())
        })
}

/// Parse a `<home>x<away>` scoreline into a pair of goal counts.
pub fn scoreline(token: &str) -> Result<(u8, u8), ServiceError> {
    let lowered = token.to_lowercase();
    let Some((home, away)) = lowered.split_once('x') else {
        return Err(ServiceError::InvalidInput(
            "Wrong scoreline format! Use <Home Goals>x<Away Goals>, for example `2x1`.".into(),
        ));
    };

    let parse_side = |side: &str| {
        side.trim().parse::<u8>().map_err(|_| {
            ServiceError::InvalidInput(
                "Goals must be non-negative whole numbers (0, 1, 2, ...).".into(),
            )
        })
    };

    Ok((parse_side(home)?, parse_side(away)?))
}

/// Parse a non-negative deadline offset in minutes.
pub fn deadline_minutes(token: &str) -> Result<i64, ServiceError> {
    token
        .parse::<i64>()
        .ok()
        .filter(|minutes| *minutes >= 0)
        .ok_or_else(|| {
            ServiceError::InvalidInput(
                "The guess deadline offset must be a non-negative number of minutes.".into(),
            )
        })
}

/// Parse `DD-MM-YYYY` + `HH:MM` entered at the given local offset into a UTC
/// instant.
pub fn local_datetime(
    date: &str,
    time: &str,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, ServiceError> {
    let combined = format!("{date} {time}");
    let naive = NaiveDateTime::parse_from_str(&combined, "%d-%m-%Y %H:%M").map_err(|_| {
        ServiceError::InvalidInput(format!(
            "Invalid game date or time: \"{combined}\". Use the format DD-MM-YYYY HH:MM."
        ))
    })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "Invalid game date or time: \"{combined}\". Use the format DD-MM-YYYY HH:MM."
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("guess 1 2x1"), vec!["guess", "1", "2x1"]);
    }

    #[test]
    fn tokenize_groups_quoted_names() {
        let tokens = tokenize("\"Serie A\" \"Atletico MG\" Cruzeiro 09-02-2025 16:00");
        assert_eq!(
            tokens,
            vec!["Serie A", "Atletico MG", "Cruzeiro", "09-02-2025", "16:00"]
        );
    }

    #[test]
    fn tokenize_handles_unterminated_quotes() {
        assert_eq!(tokenize("\"Serie A"), vec!["Serie A"]);
    }

    #[test]
    fn game_id_rejects_non_positive_values() {
        assert!(game_id("1").is_ok());
        assert!(game_id("0").is_err());
        assert!(game_id("-3").is_err());
        assert!(game_id("abc").is_err());
    }

    #[test]
    fn scoreline_accepts_both_cases_of_x() {
        assert_eq!(scoreline("2x1").unwrap(), (2, 1));
        assert_eq!(scoreline("0X0").unwrap(), (0, 0));
    }

    #[test]
    fn scoreline_rejects_malformed_input() {
        assert!(scoreline("21").is_err());
        assert!(scoreline("2-1").is_err());
        assert!(scoreline("ax b").is_err());
        assert!(scoreline("-1x2").is_err());
    }

    #[test]
    fn local_datetime_converts_to_utc() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let parsed = local_datetime("21-07-2025", "19:00", offset).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 7, 21, 22, 0, 0).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn local_datetime_rejects_garbage() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        assert!(local_datetime("2025-07-21", "19:00", offset).is_err());
        assert!(local_datetime("32-01-2025", "19:00", offset).is_err());
        assert!(local_datetime("21-07-2025", "25:00", offset).is_err());
    }
}
