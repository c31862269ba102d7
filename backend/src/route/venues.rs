use actix_session::Session;
use actix_web::{
    body::BoxBody,
    delete,
    dev::Response,
    get,
    http::StatusCode,
    post,
    web::{self, Json, Redirect},
};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    ExpressionMethods, OptionalExtension, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use validator::Validate;

use showbill_lib::{CityGroup, Page, SearchPage, SearchResults, VenueDetail};

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::flash::{self, Flashes};
use crate::forms::{self, SearchForm, VenueForm};
use crate::models::{Artist, Show, Venue};
use crate::{schema, views};

/// List every venue, grouped by distinct (city, state).
#[get("/venues")]
pub async fn list(pool: web::Data<DbPool>, flashes: Flashes) -> Result<Json<Page<Vec<CityGroup>>>> {
    let groups = list_inner(&pool, Utc::now().naive_utc()).await?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: groups,
    }))
}

pub async fn list_inner(pool: &DbPool, now: NaiveDateTime) -> Result<Vec<CityGroup>> {
    let mut db = pool.get().await?;

    let all_venues: Vec<Venue> = schema::venues::table
        .order(schema::venues::id.asc())
        .select(Venue::as_select())
        .load(&mut db)
        .await?;

    let all_shows: Vec<Show> = schema::shows::table
        .select(Show::as_select())
        .load(&mut db)
        .await?;

    let upcoming = views::upcoming_counts(&all_shows, now, |s| s.venue_id);
    Ok(views::group_by_location(&all_venues, &upcoming))
}

/// Case-insensitive substring search on venue names.
#[post("/venues/search")]
pub async fn search(
    pool: web::Data<DbPool>,
    flashes: Flashes,
    form: web::Form<SearchForm>,
) -> Result<Json<Page<SearchPage>>> {
    let SearchForm { search_term } = form.into_inner();
    let results = search_inner(&pool, &search_term, Utc::now().naive_utc()).await?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: SearchPage {
            search_term,
            results,
        },
    }))
}

pub async fn search_inner(pool: &DbPool, term: &str, now: NaiveDateTime) -> Result<SearchResults> {
    use crate::schema::venues::dsl::{id, name, venues};

    let mut db = pool.get().await?;

    let matched: Vec<Venue> = venues
        .filter(name.ilike(format!("%{term}%")))
        .order(id.asc())
        .select(Venue::as_select())
        .load(&mut db)
        .await?;

    // Each match gets the count of its own upcoming shows, not a tally of
    // every show in the table.
    let matched_ids: Vec<i32> = matched.iter().map(|v| v.id).collect();
    let their_shows: Vec<Show> = schema::shows::table
        .filter(schema::shows::venue_id.eq_any(matched_ids))
        .select(Show::as_select())
        .load(&mut db)
        .await?;

    let upcoming = views::upcoming_counts(&their_shows, now, |s| s.venue_id);
    Ok(views::search_results(
        matched.into_iter().map(|v| (v.id, v.name)),
        &upcoming,
    ))
}

/// The empty creation form.
#[get("/venues/create")]
pub async fn create_form(flashes: Flashes) -> Json<Page<VenueForm>> {
    Json(Page {
        flashes: flashes.0,
        data: VenueForm::default(),
    })
}

/// Create a venue from a validated submission. Every outcome lands back
/// on the landing page with a notice.
#[post("/venues/create")]
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    form: Json<VenueForm>,
) -> Redirect {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        flash::push(&session, forms::validation_flash(&errors));
        return Redirect::to("/").see_other();
    }

    let venue_name = form.name.clone();
    match create_inner(&pool, &form).await {
        Ok(venue) => {
            log::info!("listed venue {} ({})", venue.id, venue.name);
            flash::push(
                &session,
                format!("Venue {venue_name} was successfully listed!"),
            );
        }
        Err(e) => {
            log::error!("venue create failed: {e:?}");
            flash::push(
                &session,
                format!("An error occurred. Venue {venue_name} could not be listed."),
            );
        }
    }

    Redirect::to("/").see_other()
}

pub async fn create_inner(pool: &DbPool, form: &VenueForm) -> Result<Venue> {
    let row = form.to_row();

    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::insert_into(schema::venues::table)
                .values(row)
                .returning(Venue::as_returning())
                .get_result(db)
                .await
        })
    })
    .await
}

/// The venue page: profile plus past/upcoming show history.
#[get("/venues/{id}")]
pub async fn detail(
    pool: web::Data<DbPool>,
    flashes: Flashes,
    path: web::Path<i32>,
) -> Result<Json<Page<VenueDetail>>> {
    let venue_id = path.into_inner();
    let venue = detail_inner(&pool, venue_id, Utc::now().naive_utc())
        .await?
        .ok_or_else(|| Error::not_found(format!("venue {venue_id}")))?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: venue,
    }))
}

pub async fn detail_inner(
    pool: &DbPool,
    venue_id: i32,
    now: NaiveDateTime,
) -> Result<Option<VenueDetail>> {
    let mut db = pool.get().await?;

    let venue: Option<Venue> = schema::venues::table
        .find(venue_id)
        .select(Venue::as_select())
        .first(&mut db)
        .await
        .optional()?;

    let Some(venue) = venue else {
        return Ok(None);
    };

    let rows: Vec<(Show, Artist)> = schema::shows::table
        .inner_join(schema::artists::table)
        .filter(schema::shows::venue_id.eq(venue_id))
        .order(schema::shows::id.asc())
        .select((Show::as_select(), Artist::as_select()))
        .load(&mut db)
        .await?;

    Ok(Some(views::venue_detail(venue, &rows, now)))
}

#[derive(Debug, Serialize)]
pub struct EditVenuePage {
    pub id: i32,
    pub form: VenueForm,
}

/// The edit form, prefilled from the stored row.
#[get("/venues/{id}/edit")]
pub async fn edit_form(
    pool: web::Data<DbPool>,
    flashes: Flashes,
    path: web::Path<i32>,
) -> Result<Json<Page<EditVenuePage>>> {
    let venue_id = path.into_inner();
    let mut db = pool.get().await?;

    let venue: Option<Venue> = schema::venues::table
        .find(venue_id)
        .select(Venue::as_select())
        .first(&mut db)
        .await
        .optional()?;
    let venue = venue.ok_or_else(|| Error::not_found(format!("venue {venue_id}")))?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: EditVenuePage {
            id: venue.id,
            form: VenueForm::from_venue(&venue),
        },
    }))
}

/// Apply an edit submission. Fields are assigned directly; create is the
/// validated path. Success or failure, the user lands back on the venue
/// page.
#[post("/venues/{id}/edit")]
pub async fn edit(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i32>,
    form: Json<VenueForm>,
) -> Redirect {
    let venue_id = path.into_inner();

    match edit_inner(&pool, venue_id, &form).await {
        Ok(_) => flash::push(&session, "Venue was successfully updated!"),
        Err(e) => {
            log::error!("venue {venue_id} edit failed: {e:?}");
            flash::push(&session, "An error occurred. Venue could not be changed.");
        }
    }

    Redirect::to(format!("/venues/{venue_id}")).see_other()
}

pub async fn edit_inner(pool: &DbPool, venue_id: i32, form: &VenueForm) -> Result<Venue> {
    let changes = form.changes();

    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::update(schema::venues::table.find(venue_id))
                .set(changes)
                .returning(Venue::as_returning())
                .get_result(db)
                .await
        })
    })
    .await
}

/// Delete a venue. Venues are the only entity with a destroy path.
#[delete("/venues/{id}")]
pub async fn remove(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i32>,
) -> Response<BoxBody> {
    let venue_id = path.into_inner();

    let deleted = match remove_inner(&pool, venue_id).await {
        Ok(count) => count,
        Err(e) => {
            log::error!("venue {venue_id} delete failed: {e:?}");
            flash::push(
                &session,
                format!("An error occurred. Venue {venue_id} could not be deleted."),
            );
            return Response::new(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match deleted {
        0 => {
            flash::push(
                &session,
                format!("An error occurred. Venue {venue_id} could not be deleted."),
            );
            Response::new(StatusCode::NOT_FOUND)
        }
        1 => {
            flash::push(
                &session,
                format!("Venue {venue_id} was successfully deleted."),
            );
            Response::new(StatusCode::OK)
        }
        2.. => {
            log::error!("oops, deleted {deleted} venues for id {venue_id}");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn remove_inner(pool: &DbPool, venue_id: i32) -> Result<usize> {
    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::delete(schema::venues::table.find(venue_id))
                .execute(db)
                .await
        })
    })
    .await
}
