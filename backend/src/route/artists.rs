use actix_session::Session;
use actix_web::{
    get, post,
    web::{self, Json, Redirect},
    Either, HttpRequest,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    ExpressionMethods, OptionalExtension, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use validator::Validate;

use showbill_lib::{ArtistDetail, ArtistRow, Page, SearchPage, SearchResults};

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::flash::{self, Flashes};
use crate::forms::{self, ArtistForm, SearchForm};
use crate::models::{Artist, Show, Venue};
use crate::serialize::{self, Tabular};
use crate::{schema, views};

/// List every artist. Also serves a CSV export when the client asks.
#[get("/artists")]
pub async fn list(
    req: HttpRequest,
    session: Session,
    pool: web::Data<DbPool>,
) -> Result<Either<Tabular<ArtistRow>, Json<Page<Vec<ArtistRow>>>>> {
    let rows = list_inner(&pool).await?;

    Ok(if serialize::accepts_csv(&req) {
        Either::Left(Tabular(rows))
    } else {
        Either::Right(Json(Page {
            flashes: flash::take(&session),
            data: rows,
        }))
    })
}

pub async fn list_inner(pool: &DbPool) -> Result<Vec<ArtistRow>> {
    use crate::schema::artists::dsl::{artists, id, name};

    let mut db = pool.get().await?;

    let rows: Vec<(i32, String)> = artists
        .order(id.asc())
        .select((id, name))
        .load(&mut db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(artist_id, artist_name)| ArtistRow {
            id: artist_id,
            name: artist_name,
        })
        .collect())
}

/// Case-insensitive substring search on artist names.
#[post("/artists/search")]
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
    use crate::schema::artists::dsl::{artists, id, name};

    let mut db = pool.get().await?;

    let matched: Vec<Artist> = artists
        .filter(name.ilike(format!("%{term}%")))
        .order(id.asc())
        .select(Artist::as_select())
        .load(&mut db)
        .await?;

    let matched_ids: Vec<i32> = matched.iter().map(|a| a.id).collect();
    let their_shows: Vec<Show> = schema::shows::table
        .filter(schema::shows::artist_id.eq_any(matched_ids))
        .select(Show::as_select())
        .load(&mut db)
        .await?;

    let upcoming = views::upcoming_counts(&their_shows, now, |s| s.artist_id);
    Ok(views::search_results(
        matched.into_iter().map(|a| (a.id, a.name)),
        &upcoming,
    ))
}

/// The empty creation form.
#[get("/artists/create")]
pub async fn create_form(flashes: Flashes) -> Json<Page<ArtistForm>> {
    Json(Page {
        flashes: flashes.0,
        data: ArtistForm::default(),
    })
}

/// Create an artist from a validated submission.
#[post("/artists/create")]
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    form: Json<ArtistForm>,
) -> Redirect {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        flash::push(&session, forms::validation_flash(&errors));
        return Redirect::to("/").see_other();
    }

    let artist_name = form.name.clone();
    match create_inner(&pool, &form).await {
        Ok(artist) => {
            log::info!("listed artist {} ({})", artist.id, artist.name);
            flash::push(
                &session,
                format!("Artist {artist_name} was successfully listed!"),
            );
        }
        Err(e) => {
            log::error!("artist create failed: {e:?}");
            flash::push(
                &session,
                format!("An error occurred. Artist {artist_name} could not be listed."),
            );
        }
    }

    Redirect::to("/").see_other()
}

pub async fn create_inner(pool: &DbPool, form: &ArtistForm) -> Result<Artist> {
    let row = form.to_row();

    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::insert_into(schema::artists::table)
                .values(row)
                .returning(Artist::as_returning())
                .get_result(db)
                .await
        })
    })
    .await
}

/// The artist page: profile plus past/upcoming show history.
#[get("/artists/{id}")]
pub async fn detail(
    pool: web::Data<DbPool>,
    flashes: Flashes,
    path: web::Path<i32>,
) -> Result<Json<Page<ArtistDetail>>> {
    let artist_id = path.into_inner();
    let artist = detail_inner(&pool, artist_id, Utc::now().naive_utc())
        .await?
        .ok_or_else(|| Error::not_found(format!("artist {artist_id}")))?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: artist,
    }))
}

pub async fn detail_inner(
    pool: &DbPool,
    artist_id: i32,
    now: NaiveDateTime,
) -> Result<Option<ArtistDetail>> {
    let mut db = pool.get().await?;

    let artist: Option<Artist> = schema::artists::table
        .find(artist_id)
        .select(Artist::as_select())
        .first(&mut db)
        .await
        .optional()?;

    let Some(artist) = artist else {
        return Ok(None);
    };

    let rows: Vec<(Show, Venue)> = schema::shows::table
        .inner_join(schema::venues::table)
        .filter(schema::shows::artist_id.eq(artist_id))
        .order(schema::shows::id.asc())
        .select((Show::as_select(), Venue::as_select()))
        .load(&mut db)
        .await?;

    Ok(Some(views::artist_detail(artist, &rows, now)))
}

#[derive(Debug, Serialize)]
pub struct EditArtistPage {
    pub id: i32,
    pub form: ArtistForm,
}

/// The edit form, prefilled from the stored row.
#[get("/artists/{id}/edit")]
pub async fn edit_form(
    pool: web::Data<DbPool>,
    flashes: Flashes,
    path: web::Path<i32>,
) -> Result<Json<Page<EditArtistPage>>> {
    let artist_id = path.into_inner();
    let mut db = pool.get().await?;

    let artist: Option<Artist> = schema::artists::table
        .find(artist_id)
        .select(Artist::as_select())
        .first(&mut db)
        .await
        .optional()?;
    let artist = artist.ok_or_else(|| Error::not_found(format!("artist {artist_id}")))?;

    Ok(Json(Page {
        flashes: flashes.0,
        data: EditArtistPage {
            id: artist.id,
            form: ArtistForm::from_artist(&artist),
        },
    }))
}

/// Apply an edit submission. Edits always write the row; success or
/// failure lands back on the artist page.
#[post("/artists/{id}/edit")]
pub async fn edit(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i32>,
    form: Json<ArtistForm>,
) -> Redirect {
    let artist_id = path.into_inner();

    match edit_inner(&pool, artist_id, &form).await {
        Ok(_) => flash::push(&session, "Artist was successfully updated!"),
        Err(e) => {
            log::error!("artist {artist_id} edit failed: {e:?}");
            flash::push(&session, "An error occurred. Artist could not be changed.");
        }
    }

    Redirect::to(format!("/artists/{artist_id}")).see_other()
}

pub async fn edit_inner(pool: &DbPool, artist_id: i32, form: &ArtistForm) -> Result<Artist> {
    let changes = form.changes();

    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::update(schema::artists::table.find(artist_id))
                .set(changes)
                .returning(Artist::as_returning())
                .get_result(db)
                .await
        })
    })
    .await
}
