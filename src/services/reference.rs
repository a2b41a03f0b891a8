use chrono::{Datelike, Utc};
use rand::{thread_rng, Rng};

pub const REFERENCE_PREFIX: &str = "FZ";
pub const SUFFIX_LEN: usize = 6;

const SUFFIX_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces `FZ-<year>-<6 uppercase alphanumerics>`.
///
/// No uniqueness check happens here; the `bookings.reference` unique
/// constraint is what catches a collision.
pub fn generate() -> String {
    generate_for_year(Utc::now().year())
}

fn generate_for_year(year: i32) -> String {
    let mut rng = thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();

    format!("{REFERENCE_PREFIX}-{year}-{suffix}")
}

pub fn is_well_formed(reference: &str) -> bool {
    let mut parts = reference.splitn(3, '-');
    let (Some(prefix), Some(year), Some(suffix)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == REFERENCE_PREFIX
        && year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
