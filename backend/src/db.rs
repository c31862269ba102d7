use diesel::{Connection, PgConnection};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    scoped_futures::ScopedBoxFuture,
    AsyncConnection, AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use eyre::{eyre, Context};
use log::info;

use crate::error;
use crate::Opt;

pub type DbPool = Pool<AsyncPgConnection>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub async fn setup(opt: &Opt) -> eyre::Result<DbPool> {
    info!("connecting to database");
    let mut conn =
        PgConnection::establish(&opt.database_url).wrap_err("Failed to connect to database")?;

    if opt.run_migrations {
        info!("running database migrations");
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| eyre!("Failed to run database migrations: {e:?}"))?;
    } else {
        info!("skipping database migrations");
    }

    drop(conn);

    let manager = AsyncDieselConnectionManager::new(&opt.database_url);

    info!("setting up database pool");
    let pool: DbPool = Pool::builder(manager).build()?;

    Ok(pool)
}

/// Run `body` as a single transaction on a pooled connection: commit when
/// it returns `Ok`, roll back when it returns `Err`. The connection goes
/// back to the pool on every exit path when the guard drops.
///
/// Every mutation endpoint funnels through here, so the
/// begin/commit/rollback/release sequence exists exactly once.
pub async fn unit_of_work<'a, R, F>(pool: &DbPool, body: F) -> error::Result<R>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, diesel::QueryResult<R>>
        + Send
        + 'a,
    R: Send + 'a,
{
    let mut db = pool.get().await?;
    let conn: &mut AsyncPgConnection = &mut db;
    let value = conn.transaction(body).await?;
    Ok(value)
}
