use ab_redirector::domain::entities::{NewVariant, VariantPatch};
use ab_redirector::domain::probability::Probability;
use ab_redirector::domain::repositories::VariantRepository;
use ab_redirector::error::AppError;
use ab_redirector::infrastructure::persistence::PgVariantRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn p(value: f64) -> Probability {
    Probability::from_f64(value).unwrap()
}

fn new_variant(short_url_id: i64, target: &str, probability: f64, is_active: bool) -> NewVariant {
    NewVariant {
        short_url_id,
        target_url: target.to_string(),
        probability: p(probability),
        is_active,
    }
}

async fn create_short_url(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO short_urls (original_url, short_code) VALUES ($1, $2) RETURNING id",
    )
    .bind("https://landing.example.com/")
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test]
async fn test_create_and_list_in_creation_order(pool: PgPool) {
    let id = create_short_url(&pool, "promo").await;
    let repo = PgVariantRepository::new(Arc::new(pool));

    let a = repo.create(new_variant(id, "https://a.example.com/", 0.3, true)).await.unwrap();
    let b = repo.create(new_variant(id, "https://b.example.com/", 0.5, false)).await.unwrap();
    let c = repo.create(new_variant(id, "https://c.example.com/", 0.4, true)).await.unwrap();

    let all: Vec<i64> = repo.list_by_short_url(id).await.unwrap().iter().map(|v| v.id).collect();
    assert_eq!(all, vec![a.id, b.id, c.id]);

    let active: Vec<i64> = repo.list_active(id).await.unwrap().iter().map(|v| v.id).collect();
    assert_eq!(active, vec![a.id, c.id]);

    assert_eq!(repo.total_active_probability(id).await.unwrap(), p(0.7));
}

#[sqlx::test]
async fn test_probability_round_trips_exactly(pool: PgPool) {
    let id = create_short_url(&pool, "exact").await;
    let repo = PgVariantRepository::new(Arc::new(pool));

    repo.create(new_variant(id, "https://a.example.com/", 0.1, true)).await.unwrap();
    repo.create(new_variant(id, "https://b.example.com/", 0.2, true)).await.unwrap();
    let c = repo.create(new_variant(id, "https://c.example.com/", 0.7, true)).await.unwrap();

    assert_eq!(c.probability, p(0.7));
    assert_eq!(repo.total_active_probability(id).await.unwrap(), Probability::ONE);
}

#[sqlx::test]
async fn test_budget_enforced_on_create_and_update(pool: PgPool) {
    let id = create_short_url(&pool, "budget").await;
    let repo = PgVariantRepository::new(Arc::new(pool));

    let a = repo.create(new_variant(id, "https://a.example.com/", 0.6, true)).await.unwrap();
    repo.create(new_variant(id, "https://b.example.com/", 0.4, true)).await.unwrap();

    let err = repo
        .create(new_variant(id, "https://c.example.com/", 0.1, true))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let paused = repo
        .create(new_variant(id, "https://c.example.com/", 0.1, false))
        .await
        .unwrap();

    let err = repo
        .update(
            paused.id,
            VariantPatch {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let updated = repo
        .update(
            a.id,
            VariantPatch {
                probability: Some(p(0.5)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.probability, p(0.5));
    assert!(updated.updated_at >= updated.created_at);

    repo.update(
        paused.id,
        VariantPatch {
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(repo.total_active_probability(id).await.unwrap(), Probability::ONE);
}

#[sqlx::test]
async fn test_update_and_delete_missing_variant(pool: PgPool) {
    let repo = PgVariantRepository::new(Arc::new(pool));

    let err = repo
        .update(
            424242,
            VariantPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    assert!(!repo.delete(424242).await.unwrap());
    assert!(repo.find_by_id(424242).await.unwrap().is_none());
}

#[sqlx::test]
async fn test_concurrent_creates_serialized_per_short_url(pool: PgPool) {
    let id = create_short_url(&pool, "race").await;
    let repo = Arc::new(PgVariantRepository::new(Arc::new(pool)));
    repo.create(new_variant(id, "https://base.example.com/", 0.5, true)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create(new_variant(id, &format!("https://r{i}.example.com/"), 0.3, true))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(repo.total_active_probability(id).await.unwrap(), p(0.8));
}
