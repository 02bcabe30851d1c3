use criterion::{criterion_group, criterion_main, Criterion};
use hika::models::{Coordinate, Difficulty, HikeStats, Post, Trail, TrailSource};
use hika::services::feed::FeedView;
use hika::services::trail_search::{apply_filters, dedupe_candidates, TrailQuery};
use std::hint::black_box;

const LOCATIONS: &[&str] = &[
    "Oregon, USA",
    "Washington, USA",
    "Bend, Oregon",
    "California, USA",
    "Colorado",
];

fn synthetic_trails(n: usize) -> Vec<Trail> {
    (0..n)
        .map(|i| Trail {
            id: format!("t{}", i),
            name: format!("Trail {} {}", i, if i % 7 == 0 { "Falls" } else { "Ridge" }),
            description: "Forest loop with creek crossings".to_string(),
            location: LOCATIONS[i % LOCATIONS.len()].to_string(),
            coordinate: Coordinate::new(
                40.0 + (i % 500) as f64 * 0.01,
                -120.0 - (i / 500) as f64 * 0.01,
            ),
            path: vec![],
            distance: 1_000.0 + i as f64,
            elevation_gain: (i % 1200) as f64,
            elevation_loss: 0.0,
            difficulty: [
                Difficulty::Easy,
                Difficulty::Moderate,
                Difficulty::Hard,
                Difficulty::Expert,
            ][i % 4],
            rating: 0.0,
            rating_count: 0,
            post_count: 0,
            source: TrailSource::User,
            created_by: None,
            created_at: format!("2024-01-01T00:00:{:02}.000Z", i % 60),
        })
        .collect()
}

fn benchmark_trail_filters(c: &mut Criterion) {
    // Largest window a term search reads
    let window = synthetic_trails(1000);

    let term_and_location = TrailQuery {
        term: Some("falls".to_string()),
        location: Some("Oregon".to_string()),
        difficulty: None,
        limit: 20,
    };
    let location_only = TrailQuery {
        location: Some("Oregon, USA".to_string()),
        limit: 20,
        ..Default::default()
    };

    let mut group = c.benchmark_group("trail_search");

    group.bench_function("term_and_location_1000", |b| {
        b.iter(|| apply_filters(black_box(window.clone()), black_box(&term_and_location)))
    });

    group.bench_function("location_only_1000", |b| {
        b.iter(|| apply_filters(black_box(window.clone()), black_box(&location_only)))
    });

    let candidates = synthetic_trails(200);
    let existing = synthetic_trails(1000);
    group.bench_function("dedupe_200_against_1000", |b| {
        b.iter(|| dedupe_candidates(black_box(candidates.clone()), black_box(&existing)))
    });

    group.finish();
}

fn benchmark_feed_merge(c: &mut Criterion) {
    let chunks: Vec<Vec<Post>> = (0..5)
        .map(|chunk| {
            (0..50)
                .map(|i| Post {
                    id: format!("p{}-{}", chunk, i),
                    user_id: format!("u{}", chunk * 10 + i % 10),
                    trail_id: None,
                    description: String::new(),
                    image_urls: vec![],
                    stats: HikeStats::default(),
                    path: vec![],
                    likes: vec![],
                    comments: vec![],
                    shares: 0,
                    created_at: format!("2024-01-{:02}T00:00:00.000Z", 1 + (i + chunk) % 28),
                })
                .collect()
        })
        .collect();

    c.bench_function("feed_merge_5_chunks", |b| {
        b.iter(|| {
            let mut view = FeedView::new(50);
            for (id, posts) in chunks.iter().enumerate() {
                view.apply_snapshot(id as u64, black_box(posts.clone()));
            }
            view.posts()
        })
    });
}

criterion_group!(benches, benchmark_trail_filters, benchmark_feed_merge);
criterion_main!(benches);
