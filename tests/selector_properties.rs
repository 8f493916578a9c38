use ab_redirector::domain::entities::Variant;
use ab_redirector::domain::probability::Probability;
use ab_redirector::domain::selector::{BucketPoint, VisitorKey, select, select_at};
use chrono::Utc;

const PRIMARY: &str = "https://primary.example.com/";

fn variant(id: i64, target: &str, probability: f64) -> Variant {
    let now = Utc::now();
    Variant::new(
        id,
        1,
        target.to_string(),
        Probability::from_f64(probability).unwrap(),
        true,
        now,
        now,
    )
}

fn ab() -> Vec<Variant> {
    vec![
        variant(1, "https://a.example.com/", 0.3),
        variant(2, "https://b.example.com/", 0.4),
    ]
}

fn key(i: usize) -> VisitorKey {
    VisitorKey::new(PRIMARY, &format!("10.{}.{}.{}", i / 65536, (i / 256) % 256, i % 256))
}

fn at(ppm: u32) -> BucketPoint {
    BucketPoint::from_ppm(ppm).unwrap()
}

#[test]
fn test_boundaries_are_half_open() {
    let variants = ab();

    assert_eq!(select_at(at(0), &variants, PRIMARY).target, "https://a.example.com/");
    assert_eq!(select_at(at(299_999), &variants, PRIMARY).target, "https://a.example.com/");
    assert_eq!(select_at(at(300_000), &variants, PRIMARY).target, "https://b.example.com/");
    assert_eq!(select_at(at(699_999), &variants, PRIMARY).target, "https://b.example.com/");
    assert_eq!(select_at(at(700_000), &variants, PRIMARY).target, PRIMARY);
    assert_eq!(select_at(at(999_999), &variants, PRIMARY).target, PRIMARY);
}

#[test]
fn test_selection_is_deterministic() {
    let variants = ab();

    for i in 0..500 {
        let first = select(&key(i), &variants, PRIMARY);
        for _ in 0..3 {
            assert_eq!(select(&key(i), &variants, PRIMARY), first);
        }
    }
}

#[test]
fn test_result_is_always_a_variant_or_primary() {
    let variants = ab();
    let targets = ["https://a.example.com/", "https://b.example.com/", PRIMARY];

    for i in 0..2_000 {
        let selection = select(&key(i), &variants, PRIMARY);
        assert!(targets.contains(&selection.target));
        assert_eq!(selection.is_primary(), selection.variant_id.is_none());
    }
}

#[test]
fn test_empty_set_always_primary() {
    for i in 0..500 {
        let selection = select(&key(i), &[], PRIMARY);
        assert_eq!(selection.target, PRIMARY);
        assert!(selection.is_primary());
    }
}

#[test]
fn test_zero_probability_variant_is_never_chosen() {
    let variants = vec![
        variant(1, "https://dead.example.com/", 0.0),
        variant(2, "https://b.example.com/", 0.5),
    ];

    for i in 0..2_000 {
        assert_ne!(select(&key(i), &variants, PRIMARY).variant_id, Some(1));
    }
    assert_eq!(select_at(at(0), &variants, PRIMARY).variant_id, Some(2));
}

#[test]
fn test_traffic_split_follows_probabilities() {
    let variants = ab();
    let total = 20_000;
    let (mut a, mut b, mut primary) = (0, 0, 0);

    for i in 0..total {
        match select(&key(i), &variants, PRIMARY).variant_id {
            Some(1) => a += 1,
            Some(2) => b += 1,
            _ => primary += 1,
        }
    }

    let share = |n: usize| n as f64 / total as f64;
    assert!((share(a) - 0.3).abs() < 0.03, "a share {}", share(a));
    assert!((share(b) - 0.4).abs() < 0.03, "b share {}", share(b));
    assert!((share(primary) - 0.3).abs() < 0.03, "primary share {}", share(primary));
}

#[test]
fn test_reordering_moves_visitors() {
    let forward = vec![
        variant(1, "https://a.example.com/", 0.5),
        variant(2, "https://b.example.com/", 0.5),
    ];
    let reversed: Vec<Variant> = forward.iter().rev().cloned().collect();

    for i in 0..500 {
        let before = select(&key(i), &forward, PRIMARY);
        let after = select(&key(i), &reversed, PRIMARY);
        assert_ne!(before.variant_id, after.variant_id);
    }
}

#[test]
fn test_growing_first_variant_keeps_its_visitors() {
    let before = ab();
    let mut after = ab();
    after[0].probability = Probability::from_f64(0.35).unwrap();

    for i in 0..2_000 {
        if select(&key(i), &before, PRIMARY).variant_id == Some(1) {
            assert_eq!(select(&key(i), &after, PRIMARY).variant_id, Some(1));
        }
    }
}

#[test]
fn test_same_visitor_bucketed_per_short_link() {
    let variants = vec![variant(1, "https://a.example.com/", 0.5)];
    let differing = (0..500)
        .filter(|i| {
            let ip = format!("192.0.2.{}", i % 256);
            let one = select(&VisitorKey::new("https://one.example.com/", &ip), &variants, PRIMARY);
            let two = select(&VisitorKey::new("https://two.example.com/", &ip), &variants, PRIMARY);
            one.variant_id != two.variant_id
        })
        .count();

    assert!(differing > 0);
}
