use std::fs;
use std::path::Path;
use std::time::Duration;

use coreblog::cache::{CacheStore, ContentCache, FileStore, ManualClock};
use coreblog::markup::{Renderer, SequentialIds};
use coreblog::page::{LinkStyle, Navigation, render_page};
use coreblog::repository::{DEFAULT_MANIFEST, Repository};
use coreblog::source::FsFetcher;

fn write_site(root: &Path) {
    let posts = root.join("posts");
    fs::create_dir_all(&posts).unwrap();
    fs::write(
        posts.join("list.txt"),
        "posts/first.txt\nposts/missing.txt\nposts/third.txt\n",
    )
    .unwrap();
    fs::write(
        posts.join("first.txt"),
        "Первый пост\n1 March 2024\n# Hello\nhttps://example.com/clip.mp4",
    )
    .unwrap();
    fs::write(posts.join("third.txt"), "Third\n3 March 2024\n**done**").unwrap();
}

#[test]
fn test_unreachable_post_is_skipped_and_order_kept() {
    let site = tempfile::tempdir().unwrap();
    write_site(site.path());
    let cache_dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(cache_dir.path().join("cache.json")).unwrap();

    let mut repo = Repository::new(FsFetcher::new(site.path()), ContentCache::new(store));
    let posts = repo.load(DEFAULT_MANIFEST).unwrap();

    let ids: Vec<_> = posts.iter().map(|p| p.identifier.as_str()).collect();
    assert_eq!(ids, vec!["posts/first.txt", "posts/third.txt"]);
    assert_eq!(posts[0].title, "Первый пост");
    assert_eq!(posts[0].published_label, "1 March 2024");
}

#[test]
fn test_empty_manifest_resolves_nothing() {
    let site = tempfile::tempdir().unwrap();
    fs::create_dir_all(site.path().join("posts")).unwrap();
    fs::write(site.path().join("posts/list.txt"), "").unwrap();

    let mut repo = Repository::new(
        FsFetcher::new(site.path()),
        ContentCache::new(coreblog::cache::MemoryStore::new()),
    );
    assert!(repo.load(DEFAULT_MANIFEST).unwrap().is_empty());
}

#[test]
fn test_cache_survives_reopen_and_serves_deleted_sources() {
    let site = tempfile::tempdir().unwrap();
    write_site(site.path());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    let clock = ManualClock::new(10_000);

    {
        let store = FileStore::open(&cache_path).unwrap();
        let mut repo = Repository::new(
            FsFetcher::new(site.path()),
            ContentCache::with_clock(store, clock.clone()),
        );
        repo.load(DEFAULT_MANIFEST).unwrap();
    }

    // A live entry is served without touching the source.
    fs::remove_file(site.path().join("posts/third.txt")).unwrap();
    clock.advance(Duration::from_secs(60));

    let store = FileStore::open(&cache_path).unwrap();
    assert_eq!(store.len(), 2);
    let mut repo = Repository::new(
        FsFetcher::new(site.path()),
        ContentCache::with_clock(store, clock),
    );
    let titles: Vec<_> = repo
        .load(DEFAULT_MANIFEST)
        .unwrap()
        .iter()
        .map(|p| p.title.clone())
        .collect();
    assert_eq!(titles, vec!["Первый пост", "Third"]);
}

#[test]
fn test_zero_ttl_sweep_removes_fresh_entry() {
    let site = tempfile::tempdir().unwrap();
    write_site(site.path());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    let clock = ManualClock::new(5_000);

    let store = FileStore::open(&cache_path).unwrap();
    let mut repo = Repository::new(
        FsFetcher::new(site.path()),
        ContentCache::with_clock(store, clock),
    )
    .with_ttl(Duration::ZERO);
    repo.resolve("posts/third.txt").unwrap();

    let report = repo.sweep_expired().unwrap();
    assert_eq!(report.removed, vec!["posts/third.txt".to_string()]);
    assert!(FileStore::open(&cache_path).unwrap().is_empty());
}

#[test]
fn test_sweep_skips_foreign_keys_in_shared_file() {
    let cache_dir = tempfile::tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    fs::write(
        &cache_path,
        r#"{"theme":"dark","posts/old.txt":"{\"title\":\"Old\",\"date\":\"x\",\"content\":\"y\"}"}"#,
    )
    .unwrap();

    let store = FileStore::open(&cache_path).unwrap();
    let mut cache = ContentCache::with_clock(store, ManualClock::new(0));
    let report = cache.sweep_expired(Duration::ZERO).unwrap();
    assert!(report.removed.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(cache.store().len(), 2);
}

#[test]
fn test_resolved_posts_render_into_a_page() {
    let site = tempfile::tempdir().unwrap();
    write_site(site.path());
    let mut repo = Repository::new(
        FsFetcher::new(site.path()),
        ContentCache::new(coreblog::cache::MemoryStore::new()),
    );
    repo.load(DEFAULT_MANIFEST).unwrap();

    let mut renderer = Renderer::with_ids(SequentialIds::default());
    let nav = Navigation::from_query("?article=0&title=pervyy-post");
    let html = render_page(repo.posts(), &nav, &mut renderer, LinkStyle::Query, "Blog");

    assert!(html.contains("<title>pervyy-post | Blog</title>"));
    assert!(html.contains("<h1>Hello</h1>"));
    assert!(html.contains(r#"type="video/mp4""#));
    assert!(html.contains(r#"href="?article=1&title=third""#));
}
