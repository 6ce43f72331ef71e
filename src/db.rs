use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connects with a small fixed pool and applies embedded migrations. Callers
/// block on pool checkout when all connections are busy.
pub async fn init_db(database_url: &str, max_connections: u32) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
