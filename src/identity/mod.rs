use serde_json::Value;

const ZOONIVERSE_MARKER: &str = "-zooniverse-";
const DISCREPANCY_MARKER: &str = "-discrepancy-";
const DESIGN_MARKER: &str = "-UKMYC";
const DEFAULT_DESIGN: &str = "UKMYC5";
// "-DD-XXX": reading day and reader suffix on current-study plate images
const CURRENT_SUFFIX_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Study {
    Unknown,
    Legacy,
    Current,
}

impl Study {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Legacy => "legacy",
            Self::Current => "current",
        }
    }

    pub fn of(identity: Option<&PlateIdentity>) -> Self {
        identity.map(|i| i.study).unwrap_or(Self::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateIdentity {
    pub filename: String,
    pub plate_image: String,
    pub plate_design: String,
    pub drug: String,
    pub plate: String,
    pub study: Study,
    pub reading_day: u32,
    pub site: String,
    pub replicate: Option<String>,
    pub reader: Option<String>,
}

/// Image filename (extension stripped) for the classified subject.
///
/// Takes the first entry, in export order, whose key names an image file or
/// is one of the literal `Filename`/`Image` keys.
pub fn extract_filename(subject_data: &Value, subject_id: &str) -> Option<String> {
    let entry = subject_data.get(subject_id)?.as_object()?;
    for (key, value) in entry {
        let is_image_key = key.contains(".png")
            || key.contains(".jpg")
            || key == "Filename"
            || key == "Image";
        if !is_image_key {
            continue;
        }
        let name = value.as_str()?;
        if name.len() <= 4 || !name.is_char_boundary(name.len() - 4) {
            return None;
        }
        return Some(name[..name.len() - 4].to_string());
    }
    None
}

/// Parses plate identity fields out of a filename; `None` on any failure.
pub fn parse_filename(filename: &str) -> Option<PlateIdentity> {
    if filename.starts_with("H37") || filename.starts_with("CRY") {
        parse_legacy(filename)
    } else {
        parse_current(filename)
    }
}

/// Plate image and drug taken straight from the image name, without reading
/// the reading-day or reader tokens.
pub fn plate_image_of(filename: &str) -> Option<(&str, &str)> {
    let (image, _) = filename
        .split_once(ZOONIVERSE_MARKER)
        .or_else(|| filename.split_once(DISCREPANCY_MARKER))?;
    let image = image.find(DESIGN_MARKER).map_or(image, |idx| &image[..idx]);
    Some((image, last_chars(filename, 3)?))
}

pub fn parse_subject(subject_data: &Value, subject_id: &str) -> (Option<String>, Option<PlateIdentity>) {
    match extract_filename(subject_data, subject_id) {
        Some(filename) => {
            let identity = parse_filename(&filename);
            (Some(filename), identity)
        }
        None => (None, None),
    }
}

fn parse_legacy(filename: &str) -> Option<PlateIdentity> {
    let (plate_image, _) = filename.split_once(ZOONIVERSE_MARKER)?;
    let tokens: Vec<&str> = plate_image.split('-').collect();
    let n = tokens.len();
    if n < 5 {
        return None;
    }
    let reading_day = tokens[n - 1].parse::<u32>().ok()?;
    let (plate, _) = plate_image.rsplit_once('-')?;

    Some(PlateIdentity {
        filename: filename.to_string(),
        plate_image: plate_image.to_string(),
        plate_design: DEFAULT_DESIGN.to_string(),
        drug: last_chars(filename, 3)?.to_string(),
        plate: plate.to_string(),
        study: Study::Legacy,
        reading_day,
        site: tokens[n - 4].to_string(),
        replicate: Some(tokens[n - 3].to_string()),
        reader: Some(tokens[n - 2].to_string()),
    })
}

fn parse_current(filename: &str) -> Option<PlateIdentity> {
    let (plate_image, plate_design, plate, reading_token) =
        if let Some(idx) = filename.find(DESIGN_MARKER) {
            let plate_image = &filename[..idx];
            let rest = &filename[idx + 1..];
            let design_end = rest
                .find("-zooniverse")
                .or_else(|| rest.find("-discrepancy"))?;
            let design = &rest[..design_end];
            if plate_image.len() <= CURRENT_SUFFIX_LEN
                || !plate_image.is_char_boundary(plate_image.len() - CURRENT_SUFFIX_LEN)
            {
                return None;
            }
            let plate = &plate_image[..plate_image.len() - CURRENT_SUFFIX_LEN];
            let tokens: Vec<&str> = plate_image.split('-').collect();
            if tokens.len() < 2 {
                return None;
            }
            (plate_image, design, plate, tokens[tokens.len() - 2])
        } else {
            let (plate_image, _) = filename
                .split_once(ZOONIVERSE_MARKER)
                .or_else(|| filename.split_once(DISCREPANCY_MARKER))?;
            let (plate, reading_token) = plate_image.rsplit_once('-')?;
            (plate_image, DEFAULT_DESIGN, plate, reading_token)
        };

    let reading_day = reading_token.parse::<u32>().ok()?;
    let site = first_chars(plate_image, 2)?;

    Some(PlateIdentity {
        filename: filename.to_string(),
        plate_image: plate_image.to_string(),
        plate_design: plate_design.to_string(),
        drug: last_chars(filename, 3)?.to_string(),
        plate: plate.to_string(),
        study: Study::Current,
        reading_day,
        site: site.to_string(),
        replicate: None,
        reader: None,
    })
}

fn last_chars(s: &str, n: usize) -> Option<&str> {
    let (idx, _) = s.char_indices().rev().nth(n - 1)?;
    Some(&s[idx..])
}

fn first_chars(s: &str, n: usize) -> Option<&str> {
    match s.char_indices().nth(n) {
        Some((idx, _)) => Some(&s[..idx]),
        None if s.chars().count() == n => Some(s),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_helpers() {
        assert_eq!(last_chars("abcdef", 3), Some("def"));
        assert_eq!(last_chars("ab", 3), None);
        assert_eq!(first_chars("abcdef", 2), Some("ab"));
        assert_eq!(first_chars("ab", 2), Some("ab"));
        assert_eq!(first_chars("a", 2), None);
    }
}
