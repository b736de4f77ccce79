//! Supported country/locale codes.
//!
//! Files are tagged with one of these codes; the detection endpoint
//! validates detector output against this table and falls back to
//! [`FALLBACK_COUNTRY`] on anything unrecognized.

/// Country applied when nothing (valid) was supplied or detected.
pub const FALLBACK_COUNTRY: &str = "UK";

/// Every country/locale code the analysis pipeline accepts. Compound codes
/// carry a language or region suffix (`CA_FR`, `AFRICA_EN`, ...).
pub const SUPPORTED_COUNTRIES: [&str; 91] = [
    "AE", "AE_AR", "AFRICA_EN", "AFRICA_FR", "AFRICA_PT", "AL", "AR", "AT", "AU", "AZ", "BA",
    "BD", "BE", "BE_FR", "BG", "BR", "CA", "CA_FR", "CH", "CH_FR", "CL", "CN", "CO", "CZ", "DE",
    "DK", "EE", "EG", "ES", "FI", "FR", "GE", "GR", "HK", "HK_EN", "HR", "HU", "ID", "IE", "IL",
    "IN", "IQ_AR", "IQ_KU", "IRAN", "IT", "JP", "KB", "KZ_KZ", "KZ_RU", "LATIN", "LATIN_EN",
    "LEVANT", "LEVANT_AR", "LT", "LV", "MK", "MM", "MN", "MX", "MY", "N_AFRICA", "NL", "NO",
    "NZ", "PE", "PH", "PK", "PL", "PS", "PT", "PY", "RO", "RS", "SA", "SA_EN", "SE", "SEC",
    "SG", "SI", "SK", "TH", "TR", "TW", "UA", "UK", "US", "UY", "UZ_RU", "UZ_UZ", "VN", "ZA",
];

/// Whether `code` is a known country/locale code (exact, case-sensitive).
pub fn is_supported_country(code: &str) -> bool {
    SUPPORTED_COUNTRIES.contains(&code)
}
