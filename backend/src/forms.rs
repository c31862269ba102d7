//! Submitted form payloads and their validation.
//!
//! The form widgets themselves live in the renderer; what arrives here is
//! the decoded field set. Create submissions are validated before any row
//! is built, edit submissions are assigned verbatim.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{Validate, ValidationErrors};

use crate::models::{
    Artist, ArtistChanges, NewArtist, NewShow, NewVenue, Venue, VenueChanges,
};

/// Form tokens accepted as `true` for checkbox-style fields, matched
/// case-insensitively. Anything else (or an absent field) is `false`.
pub const TRUTHY_TOKENS: [&str; 6] = ["true", "t", "y", "yes", "on", "1"];

/// A checkbox value as the form layer submits it: a real bool, one of
/// [`TRUTHY_TOKENS`], the number 1, or nothing at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormBool(pub bool);

impl<'de> Deserialize<'de> for FormBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;

        let truthy = match raw {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::String(s) => {
                TRUTHY_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(&s))
            }
            serde_json::Value::Number(n) => n.as_u64() == Some(1),
            _ => false,
        };

        Ok(FormBool(truthy))
    }
}

impl Serialize for FormBool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(self.0)
    }
}

/// Deserialize an optional text field, treating blank input as absent.
pub fn deserialize_unless_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VenueForm {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "is required"))]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub phone: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub image_link: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub facebook_link: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_talent: FormBool,
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub seeking_description: Option<String>,
}

impl VenueForm {
    pub fn to_row(&self) -> NewVenue {
        NewVenue {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            genres: self.genres.clone(),
            facebook_link: self.facebook_link.clone(),
            website: self.website.clone(),
            image_link: self.image_link.clone(),
            seeking_talent: self.seeking_talent.0,
            seeking_description: self.seeking_description.clone(),
        }
    }

    pub fn changes(&self) -> VenueChanges {
        VenueChanges {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            genres: self.genres.clone(),
            facebook_link: self.facebook_link.clone(),
            website: self.website.clone(),
            image_link: self.image_link.clone(),
            seeking_talent: self.seeking_talent.0,
            seeking_description: self.seeking_description.clone(),
        }
    }

    /// Prefill for the edit form.
    pub fn from_venue(venue: &Venue) -> Self {
        VenueForm {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone(),
            genres: venue.genres.clone(),
            image_link: venue.image_link.clone(),
            facebook_link: venue.facebook_link.clone(),
            website: venue.website.clone(),
            seeking_talent: FormBool(venue.seeking_talent),
            seeking_description: venue.seeking_description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ArtistForm {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "is required"))]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub phone: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub image_link: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub facebook_link: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_venue: FormBool,
    #[serde(default, deserialize_with = "deserialize_unless_blank")]
    pub seeking_description: Option<String>,
}

impl ArtistForm {
    pub fn to_row(&self) -> NewArtist {
        NewArtist {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            phone: self.phone.clone(),
            genres: self.genres.clone(),
            facebook_link: self.facebook_link.clone(),
            website: self.website.clone(),
            image_link: self.image_link.clone(),
            seeking_venue: self.seeking_venue.0,
            seeking_description: self.seeking_description.clone(),
        }
    }

    pub fn changes(&self) -> ArtistChanges {
        ArtistChanges {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            phone: self.phone.clone(),
            genres: self.genres.clone(),
            facebook_link: self.facebook_link.clone(),
            website: self.website.clone(),
            image_link: self.image_link.clone(),
            seeking_venue: self.seeking_venue.0,
            seeking_description: self.seeking_description.clone(),
        }
    }

    /// Prefill for the edit form.
    pub fn from_artist(artist: &Artist) -> Self {
        ArtistForm {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone(),
            genres: artist.genres.clone(),
            image_link: artist.image_link.clone(),
            facebook_link: artist.facebook_link.clone(),
            website: artist.website.clone(),
            seeking_venue: FormBool(artist.seeking_venue),
            seeking_description: artist.seeking_description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ShowForm {
    #[validate(range(min = 1, message = "must reference an artist"))]
    pub artist_id: i32,
    #[validate(range(min = 1, message = "must reference a venue"))]
    pub venue_id: i32,
    #[validate(length(min = 1, message = "is required"))]
    pub start_time: String,
}

impl ShowForm {
    /// Build the insert row, if the submitted start time parses.
    pub fn to_row(&self) -> Option<NewShow> {
        Some(NewShow {
            artist_id: self.artist_id,
            venue_id: self.venue_id,
            start_time: parse_start_time(&self.start_time)?,
        })
    }
}

/// Parse a submitted start time, with or without the `T` separator.
pub fn parse_start_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// The search box payload. A missing or empty term matches every row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search_term: String,
}

/// Collapse validation failures into the single aggregated notice shown
/// on the landing page, e.g. `Errors [name is required, website must be a
/// valid URL]`. Fields are sorted so the message is deterministic.
pub fn validation_flash(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let joined = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect::<Vec<_>>()
                .join("|");
            format!("{field} {joined}")
        })
        .collect();
    parts.sort();

    format!("Errors [{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkbox_tokens_coerce_to_bool() {
        for value in [json!(true), json!("on"), json!("ON"), json!("y"), json!("Yes"), json!(1)] {
            let parsed: FormBool = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(parsed, FormBool(true), "expected {value} to be truthy");
        }

        for value in [json!(false), json!("no"), json!("off"), json!(""), json!(0), json!(null)] {
            let parsed: FormBool = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(parsed, FormBool(false), "expected {value} to be falsy");
        }
    }

    #[test]
    fn absent_checkbox_defaults_to_false() {
        let form: VenueForm = serde_json::from_value(json!({
            "name": "The Musical Hop",
            "city": "San Francisco",
            "state": "CA",
            "address": "1015 Folsom Street",
        }))
        .unwrap();

        assert_eq!(form.seeking_talent, FormBool(false));
    }

    #[test]
    fn blank_optionals_become_none() {
        let form: VenueForm = serde_json::from_value(json!({
            "name": "The Musical Hop",
            "city": "San Francisco",
            "state": "CA",
            "address": "1015 Folsom Street",
            "phone": "",
            "website": "   ",
            "seeking_description": "a description",
        }))
        .unwrap();

        assert_eq!(form.phone, None);
        assert_eq!(form.website, None);
        assert_eq!(form.seeking_description.as_deref(), Some("a description"));
    }

    #[test]
    fn validation_failures_aggregate_into_one_notice() {
        let form = VenueForm {
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            website: Some("not a url".into()),
            ..Default::default()
        };

        let errors = form.validate().unwrap_err();
        let notice = validation_flash(&errors);

        assert!(notice.starts_with("Errors ["), "got: {notice}");
        assert!(notice.contains("name is required"), "got: {notice}");
        assert!(notice.contains("website must be a valid URL"), "got: {notice}");
    }

    #[test]
    fn valid_form_passes_and_builds_a_row() {
        let form = VenueForm {
            name: "The Musical Hop".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            genres: vec!["Jazz".into(), "Reggae".into()],
            website: Some("https://www.themusicalhop.com".into()),
            seeking_talent: FormBool(true),
            ..Default::default()
        };

        assert!(form.validate().is_ok());

        let row = form.to_row();
        assert_eq!(row.name, "The Musical Hop");
        assert!(row.seeking_talent);
        assert_eq!(row.genres.len(), 2);
    }

    #[test]
    fn start_times_parse_with_either_separator() {
        let expected = chrono::NaiveDate::from_ymd_opt(2035, 5, 21)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();

        assert_eq!(parse_start_time("2035-05-21 21:30:00"), Some(expected));
        assert_eq!(parse_start_time("2035-05-21T21:30:00"), Some(expected));
        assert_eq!(parse_start_time("next tuesday"), None);
    }

    #[test]
    fn edit_prefill_round_trips_the_row() {
        let venue = Venue {
            id: 7,
            name: "Park Square Live Music & Coffee".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "34 Whiskey Moore Ave".into(),
            genres: vec!["Rock n Roll".into()],
            seeking_talent: true,
            ..Default::default()
        };

        let form = VenueForm::from_venue(&venue);
        let changes = form.changes();

        assert_eq!(changes.name, venue.name);
        assert_eq!(changes.genres, venue.genres);
        assert!(changes.seeking_talent);
    }
}
