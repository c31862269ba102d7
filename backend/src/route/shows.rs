use actix_session::Session;
use actix_web::{
    get, post,
    web::{self, Json, Redirect},
    Either, HttpRequest,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use validator::Validate;

use showbill_lib::{Page, ShowListing};

use crate::db::{self, DbPool};
use crate::error::Result;
use crate::flash::{self, Flashes};
use crate::forms::{self, ShowForm};
use crate::models::{Artist, NewShow, Show, Venue};
use crate::serialize::{self, Tabular};
use crate::{schema, views};

/// List every show joined with both sides of the booking, in storage
/// order. Also serves a CSV export when the client asks.
#[get("/shows")]
pub async fn list(
    req: HttpRequest,
    session: Session,
    pool: web::Data<DbPool>,
) -> Result<Either<Tabular<ShowListing>, Json<Page<Vec<ShowListing>>>>> {
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

pub async fn list_inner(pool: &DbPool) -> Result<Vec<ShowListing>> {
    let mut db = pool.get().await?;

    let rows: Vec<(Show, Artist, Venue)> = schema::shows::table
        .inner_join(schema::artists::table)
        .inner_join(schema::venues::table)
        .order(schema::shows::id.asc())
        .select((Show::as_select(), Artist::as_select(), Venue::as_select()))
        .load(&mut db)
        .await?;

    Ok(views::show_listings(&rows))
}

/// The empty creation form.
#[get("/shows/create")]
pub async fn create_form(flashes: Flashes) -> Json<Page<ShowForm>> {
    Json(Page {
        flashes: flashes.0,
        data: ShowForm::default(),
    })
}

/// Book a show. The referenced artist and venue must exist; the
/// database's foreign keys reject anything else and the failure surfaces
/// as a notice like any other persistence error.
#[post("/shows/create")]
pub async fn create(pool: web::Data<DbPool>, session: Session, form: Json<ShowForm>) -> Redirect {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        flash::push(&session, forms::validation_flash(&errors));
        return Redirect::to("/").see_other();
    }

    let Some(row) = form.to_row() else {
        flash::push(
            &session,
            "Errors [start_time must be formatted YYYY-MM-DD HH:MM:SS]",
        );
        return Redirect::to("/").see_other();
    };

    match create_inner(&pool, row).await {
        Ok(show) => {
            log::info!(
                "booked show {} (artist {} at venue {})",
                show.id,
                show.artist_id,
                show.venue_id
            );
            flash::push(&session, "Show was successfully listed!");
        }
        Err(e) => {
            log::error!("show create failed: {e:?}");
            flash::push(&session, "An error occurred. Show could not be listed.");
        }
    }

    Redirect::to("/").see_other()
}

pub async fn create_inner(pool: &DbPool, row: NewShow) -> Result<Show> {
    db::unit_of_work(pool, move |db| {
        Box::pin(async move {
            diesel::insert_into(schema::shows::table)
                .values(row)
                .returning(Show::as_returning())
                .get_result(db)
                .await
        })
    })
    .await
}
