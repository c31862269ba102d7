//! The read-model layer: pure functions that turn loaded rows into the
//! page payloads of `showbill_lib`.
//!
//! Handlers compute "now" once per request and pass it down, so the
//! past/upcoming partition is deterministic and testable. Both partition
//! boundaries are strict: a show starting exactly at "now" is in neither
//! bucket.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use showbill_lib::{
    ArtistDetail, ArtistShowEntry, CityGroup, SearchMatch, SearchResults, ShowListing,
    VenueDetail, VenueShowEntry, VenueSummary,
};

use crate::models::{Artist, Show, Venue};

pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_start_time(start_time: NaiveDateTime) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

/// Count upcoming shows (strictly later than `now`) per owner, where
/// `owner` picks the venue or artist side of each show.
pub fn upcoming_counts(
    shows: &[Show],
    now: NaiveDateTime,
    owner: impl Fn(&Show) -> i32,
) -> HashMap<i32, i64> {
    let mut counts = HashMap::new();
    for show in shows {
        if show.start_time > now {
            *counts.entry(owner(show)).or_insert(0) += 1;
        }
    }
    counts
}

/// Group venues into distinct (city, state) buckets in first-encounter
/// order. A venue with no shows gets a zero count, not an error.
pub fn group_by_location(venues: &[Venue], upcoming: &HashMap<i32, i64>) -> Vec<CityGroup> {
    let mut groups: Vec<CityGroup> = Vec::new();

    for venue in venues {
        let summary = VenueSummary {
            id: venue.id,
            name: venue.name.clone(),
            num_upcoming_shows: upcoming.get(&venue.id).copied().unwrap_or(0),
        };

        match groups
            .iter_mut()
            .find(|group| group.city == venue.city && group.state == venue.state)
        {
            Some(group) => group.venues.push(summary),
            None => groups.push(CityGroup {
                city: venue.city.clone(),
                state: venue.state.clone(),
                venues: vec![summary],
            }),
        }
    }

    groups
}

/// Assemble search results. Each match carries the count of its own
/// upcoming shows, not a table-wide tally.
pub fn search_results(
    matches: impl IntoIterator<Item = (i32, String)>,
    upcoming: &HashMap<i32, i64>,
) -> SearchResults {
    let data: Vec<SearchMatch> = matches
        .into_iter()
        .map(|(id, name)| SearchMatch {
            id,
            name,
            num_upcoming_shows: upcoming.get(&id).copied().unwrap_or(0),
        })
        .collect();

    SearchResults {
        count: data.len(),
        data,
    }
}

fn partition_venue_shows(
    rows: &[(Show, Artist)],
    now: NaiveDateTime,
) -> (Vec<VenueShowEntry>, Vec<VenueShowEntry>) {
    let mut past = Vec::new();
    let mut upcoming = Vec::new();

    for (show, artist) in rows {
        let entry = VenueShowEntry {
            artist_id: artist.id,
            artist_name: artist.name.clone(),
            artist_image_link: artist.image_link.clone(),
            start_time: format_start_time(show.start_time),
        };

        if show.start_time < now {
            past.push(entry);
        } else if show.start_time > now {
            upcoming.push(entry);
        }
    }

    (past, upcoming)
}

fn partition_artist_shows(
    rows: &[(Show, Venue)],
    now: NaiveDateTime,
) -> (Vec<ArtistShowEntry>, Vec<ArtistShowEntry>) {
    let mut past = Vec::new();
    let mut upcoming = Vec::new();

    for (show, venue) in rows {
        let entry = ArtistShowEntry {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            venue_image_link: venue.image_link.clone(),
            start_time: format_start_time(show.start_time),
        };

        if show.start_time < now {
            past.push(entry);
        } else if show.start_time > now {
            upcoming.push(entry);
        }
    }

    (past, upcoming)
}

pub fn venue_detail(venue: Venue, rows: &[(Show, Artist)], now: NaiveDateTime) -> VenueDetail {
    let (past_shows, upcoming_shows) = partition_venue_shows(rows, now);

    VenueDetail {
        id: venue.id,
        name: venue.name,
        genres: venue.genres,
        address: venue.address,
        city: venue.city,
        state: venue.state,
        phone: venue.phone,
        website: venue.website,
        facebook_link: venue.facebook_link,
        seeking_talent: venue.seeking_talent,
        seeking_description: venue.seeking_description,
        image_link: venue.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }
}

pub fn artist_detail(artist: Artist, rows: &[(Show, Venue)], now: NaiveDateTime) -> ArtistDetail {
    let (past_shows, upcoming_shows) = partition_artist_shows(rows, now);

    ArtistDetail {
        id: artist.id,
        name: artist.name,
        genres: artist.genres,
        city: artist.city,
        state: artist.state,
        phone: artist.phone,
        website: artist.website,
        facebook_link: artist.facebook_link,
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description,
        image_link: artist.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }
}

pub fn show_listings(rows: &[(Show, Artist, Venue)]) -> Vec<ShowListing> {
    rows.iter()
        .map(|(show, artist, venue)| ShowListing {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            artist_id: artist.id,
            artist_name: artist.name.clone(),
            artist_image_link: artist.image_link.clone(),
            start_time: format_start_time(show.start_time),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn venue(id: i32, name: &str, city: &str, state: &str) -> Venue {
        Venue {
            id,
            name: name.into(),
            city: city.into(),
            state: state.into(),
            ..Default::default()
        }
    }

    fn show(id: i32, artist_id: i32, venue_id: i32, start_time: NaiveDateTime) -> Show {
        Show {
            id,
            artist_id,
            venue_id,
            start_time,
        }
    }

    #[test]
    fn venues_group_by_distinct_city_state() {
        let venues = [
            venue(1, "The Musical Hop", "San Francisco", "CA"),
            venue(2, "Park Square Live Music & Coffee", "San Francisco", "CA"),
            venue(3, "The Dueling Pianos Bar", "New York", "NY"),
        ];

        let groups = group_by_location(&venues, &HashMap::new());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].city, "San Francisco");
        let ids: Vec<i32> = groups[0].venues.iter().map(|v| v.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(groups[1].city, "New York");
        assert_eq!(groups[1].venues.len(), 1);
    }

    #[test]
    fn same_city_in_two_states_stays_in_two_groups() {
        let venues = [
            venue(1, "a", "Springfield", "IL"),
            venue(2, "b", "Springfield", "MA"),
        ];

        let groups = group_by_location(&venues, &HashMap::new());
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn venue_without_shows_counts_zero() {
        let venues = [venue(1, "The Musical Hop", "San Francisco", "CA")];

        let groups = group_by_location(&venues, &HashMap::new());
        assert_eq!(groups[0].venues[0].num_upcoming_shows, 0);
    }

    #[test]
    fn upcoming_counts_use_strict_comparison() {
        let now = at(12);
        let shows = [
            show(1, 1, 1, at(10)), // past
            show(2, 1, 1, at(12)), // exactly now
            show(3, 1, 1, at(14)), // upcoming
            show(4, 1, 2, at(15)), // other venue
        ];

        let counts = upcoming_counts(&shows, now, |s| s.venue_id);
        assert_eq!(counts.get(&1), Some(&1));
        assert_eq!(counts.get(&2), Some(&1));
    }

    #[test]
    fn search_counts_are_per_match_not_table_wide() {
        let now = at(12);
        let shows = [
            show(1, 1, 1, at(14)),
            show(2, 1, 1, at(15)),
            show(3, 1, 2, at(16)),
        ];
        let upcoming = upcoming_counts(&shows, now, |s| s.venue_id);

        let results = search_results(
            [(1, "The Musical Hop".to_string()), (2, "Example Venue".to_string())],
            &upcoming,
        );

        assert_eq!(results.count, 2);
        assert_eq!(results.data[0].num_upcoming_shows, 2);
        assert_eq!(results.data[1].num_upcoming_shows, 1);
    }

    #[test]
    fn show_at_exactly_now_lands_in_neither_bucket() {
        let now = at(12);
        let artist = Artist {
            id: 9,
            name: "Guns N Petals".into(),
            ..Default::default()
        };
        let rows = vec![
            (show(1, 9, 1, at(10)), artist.clone()),
            (show(2, 9, 1, at(12)), artist.clone()),
            (show(3, 9, 1, at(14)), artist.clone()),
        ];

        let detail = venue_detail(venue(1, "The Musical Hop", "San Francisco", "CA"), &rows, now);

        assert_eq!(detail.past_shows_count, 1);
        assert_eq!(detail.upcoming_shows_count, 1);
        assert_eq!(detail.past_shows.len(), detail.past_shows_count);
        assert_eq!(detail.upcoming_shows.len(), detail.upcoming_shows_count);
        assert_eq!(detail.past_shows[0].artist_name, "Guns N Petals");
        assert_eq!(detail.past_shows[0].start_time, "2030-01-15 10:00:00");
    }

    #[test]
    fn artist_detail_lists_the_venue_side() {
        let now = at(12);
        let home = venue(3, "The Dueling Pianos Bar", "New York", "NY");
        let rows = vec![(show(1, 9, 3, at(20)), home)];

        let artist = Artist {
            id: 9,
            name: "Guns N Petals".into(),
            ..Default::default()
        };
        let detail = artist_detail(artist, &rows, now);

        assert_eq!(detail.past_shows_count, 0);
        assert_eq!(detail.upcoming_shows_count, 1);
        assert_eq!(detail.upcoming_shows[0].venue_id, 3);
        assert_eq!(detail.upcoming_shows[0].venue_name, "The Dueling Pianos Bar");
    }

    #[test]
    fn start_times_render_without_the_t_separator() {
        assert_eq!(format_start_time(at(9)), "2030-01-15 09:00:00");
    }
}
