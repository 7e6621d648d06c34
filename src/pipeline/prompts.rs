//! Fixed instructions sent to the vision model, one per assessment step.
//!
//! Every prompt demands a bare JSON object; the interpreter still tolerates
//! models that wrap it in prose or fences.

use crate::models::enums::CertificateType;

pub const READABILITY: &str = "\
You are inspecting a scanned compliance document for legibility.

Assess image quality: blur, glare, cropping, resolution, skew, missing pages.
Do not judge the document's content, only whether a human could read it.

Respond with only a JSON object in exactly this shape:
{
  \"is_readable\": true or false,
  \"quality_score\": number from 0 to 100,
  \"issues\": [\"short description of each quality problem\"]
}";

pub const AUTHENTICITY: &str = "\
You are examining a carbon compliance document for signs of tampering or forgery.

Look for: inconsistent fonts or alignment, pixelation around figures, missing or
malformed official seals and signatures, arithmetic that does not add up,
implausible issuer names, and signs of digital editing.

Respond with only a JSON object in exactly this shape:
{
  \"authenticity_score\": number from 0 to 100 (100 = certainly genuine),
  \"indicators\": [\"each sign supporting authenticity\"],
  \"red_flags\": [\"each specific concern\"]
}";

pub const EXTRACTION: &str = "\
Extract the emissions metadata from this carbon compliance document.

Report values exactly as printed; use null for anything not present. Dates in
YYYY-MM-DD where possible. Confidences are your certainty, 0 to 100, per field.

Respond with only a JSON object in exactly this shape:
{
  \"co2_value\": number or null,
  \"co2_unit\": \"tonnes\" or \"kg\" or null,
  \"co2_confidence\": number,
  \"issue_date\": \"YYYY-MM-DD\" or null,
  \"issue_date_confidence\": number,
  \"expiry_date\": \"YYYY-MM-DD\" or null,
  \"expiry_date_confidence\": number,
  \"issuing_authority\": string or null,
  \"issuing_authority_confidence\": number,
  \"certificate_number\": string or null,
  \"verification_standard\": string or null
}";

/// The relevance prompt enumerates the accepted document types by their
/// printed labels so the model answers in our vocabulary.
pub fn relevance() -> String {
    let labels: Vec<&str> = CertificateType::all().iter().map(|t| t.label()).collect();
    format!(
        "\
You are classifying whether this document is a carbon emissions compliance document.

Accepted document types:
{}

A relevant document reports, certifies or offsets greenhouse gas emissions.
Invoices, marketing material, unrelated certificates and photographs are not relevant.

Respond with only a JSON object in exactly this shape:
{{
  \"is_relevant\": true or false,
  \"document_type\": one of the accepted types above, or null,
  \"confidence\": number from 0 to 100
}}",
        labels
            .iter()
            .map(|l| format!("- {l}"))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Map a model-reported document type label back onto the closed enum.
/// Matching is case-insensitive and tolerates snake_case answers.
pub fn match_certificate_type(raw: &str) -> Option<CertificateType> {
    let lowered = raw.trim().to_lowercase().replace('_', " ");
    CertificateType::all()
        .iter()
        .copied()
        .find(|t| t.label().to_lowercase() == lowered || t.as_str().replace('_', " ") == lowered)
}
