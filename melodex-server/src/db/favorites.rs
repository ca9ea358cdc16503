//! Favorite song persistence
//!
//! The `(user_id, spotify_id)` UNIQUE constraint is the only guard against
//! duplicate favorites; concurrent adds race on it and exactly one wins.

use melodex_common::{FavoriteSong, NewFavorite};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_timestamp, now_micros};

/// Result of inserting a favorite
#[derive(Debug)]
pub enum InsertOutcome {
    /// Record created with a store-assigned id
    Created(FavoriteSong),
    /// The user already has this catalog item as a favorite
    Duplicate,
}

/// All favorites of a user, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<FavoriteSong>> {
    sqlx::query_as::<_, FavoriteSong>(
        r#"
        SELECT id, user_id, spotify_id, name, artists, album, album_art,
               preview_url, external_url, created_at
        FROM favorite_songs
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Insert a favorite for `user_id`
///
/// A unique-constraint violation is reported as [`InsertOutcome::Duplicate`],
/// every other failure as an error.
pub async fn insert(
    pool: &SqlitePool,
    user_id: &str,
    song: &NewFavorite,
) -> sqlx::Result<InsertOutcome> {
    let id = Uuid::new_v4().to_string();
    let created_at = now_micros();

    let result = sqlx::query(
        r#"
        INSERT INTO favorite_songs
            (id, user_id, spotify_id, name, artists, album, album_art,
             preview_url, external_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&song.spotify_id)
    .bind(&song.name)
    .bind(&song.artists)
    .bind(&song.album)
    .bind(&song.album_art)
    .bind(&song.preview_url)
    .bind(&song.external_url)
    .bind(format_timestamp(&created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Created(FavoriteSong {
            id,
            user_id: user_id.to_string(),
            spotify_id: song.spotify_id.clone(),
            name: song.name.clone(),
            artists: song.artists.clone(),
            album: song.album.clone(),
            album_art: song.album_art.clone(),
            preview_url: song.preview_url.clone(),
            external_url: song.external_url.clone(),
            created_at,
        })),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Ok(InsertOutcome::Duplicate)
        }
        Err(e) => Err(e),
    }
}

/// Delete the favorite `id` only if it belongs to `user_id`
///
/// Returns the number of deleted rows (0 or 1; `id` is the primary key).
pub async fn delete_owned(pool: &SqlitePool, id: &str, user_id: &str) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM favorite_songs WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn song(spotify_id: &str) -> NewFavorite {
        NewFavorite {
            spotify_id: spotify_id.to_string(),
            name: format!("Song {}", spotify_id),
            artists: "Artist X".to_string(),
            album: "Album Y".to_string(),
            album_art: None,
            preview_url: None,
            external_url: format!("https://open.spotify.com/track/{}", spotify_id),
        }
    }

    #[tokio::test]
    async fn test_insert_then_list_newest_first() {
        let pool = connect_in_memory().await.unwrap();

        insert(&pool, "alice", &song("T1")).await.unwrap();
        insert(&pool, "alice", &song("T2")).await.unwrap();
        insert(&pool, "bob", &song("T3")).await.unwrap();

        let favorites = list_for_user(&pool, "alice").await.unwrap();
        let ids: Vec<&str> = favorites.iter().map(|f| f.spotify_id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_reported() {
        let pool = connect_in_memory().await.unwrap();

        let first = insert(&pool, "alice", &song("T1")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Created(_)));

        let second = insert(&pool, "alice", &song("T1")).await.unwrap();
        assert!(matches!(second, InsertOutcome::Duplicate));

        assert_eq!(list_for_user(&pool, "alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let pool = connect_in_memory().await.unwrap();

        let InsertOutcome::Created(favorite) = insert(&pool, "alice", &song("T1")).await.unwrap()
        else {
            panic!("Expected Created");
        };

        assert_eq!(delete_owned(&pool, &favorite.id, "bob").await.unwrap(), 0);
        assert_eq!(list_for_user(&pool, "alice").await.unwrap().len(), 1);

        assert_eq!(delete_owned(&pool, &favorite.id, "alice").await.unwrap(), 1);
        assert!(list_for_user(&pool, "alice").await.unwrap().is_empty());
    }
}
