//! Integration tests against live STAC catalogs.
//!
//! All tests here need network access and are `#[ignore]`d.
//! Run with: `cargo test -p strata-cloud -- --ignored stac`

use strata_core::{BBox, Region};
use strata_cloud::{
    StacCatalog, StacClient, StacClientOptions, StacConfig, StacProber, StacSearchParams,
    StacSourceMap,
};
use strata_engine::{
    AvailabilityArchive, CompositeEngine, EngineConfig, FrameQuery, QueryOptions, TimePeriod,
    WindowRadius,
};

fn bogota() -> Region {
    Region::new("bogota", BBox::new(-74.2, 4.5, -74.0, 4.7), 0.00025).unwrap()
}

/// Landsat 8 scenes over Bogotá in 2020 on Planetary Computer.
#[tokio::test]
#[ignore]
async fn stac_planetary_computer_landsat_count() {
    let client = StacClient::new(StacCatalog::PlanetaryComputer, StacClientOptions::default())
        .expect("failed to create client");

    let query = FrameQuery {
        sources: vec!["LANDSAT/LC08/C02/T1_L2".into()],
        range: TimePeriod::new(2020, WindowRadius::Exact).unwrap().range(),
        region: bogota(),
        masked: false,
        options: QueryOptions::default(),
    };
    let params = StacSourceMap::landsat_c2()
        .search_params(&query.sources[0], &query)
        .unwrap();

    let count = client.count(&params).await.expect("count failed");
    println!("LC08 T1 2020: {count} scenes");
    assert!(count > 0, "Bogotá should have Landsat 8 coverage in 2020");

    let page = client.search(&params.clone().limit(3)).await.expect("search failed");
    for item in &page.features {
        assert_eq!(item.collection.as_deref(), Some("landsat-c2-l2"));
        assert_eq!(item.properties.platform.as_deref(), Some("landsat-8"));
        assert!(item.properties.eo_cloud_cover.unwrap_or(0.0) <= 90.0);
    }
}

/// Landsat 5 ended in 2013, so 2020 has nothing.
#[tokio::test]
#[ignore]
async fn stac_no_landsat5_after_decommission() {
    let client = StacClient::new(StacCatalog::PlanetaryComputer, StacClientOptions::default())
        .expect("failed to create client");

    let params = StacSearchParams::new()
        .bbox(&bogota().bbox)
        .datetime("2020-01-01T00:00:00Z/2020-12-31T23:59:59Z")
        .collections(&["landsat-c2-l2"])
        .filter("platform", "eq", serde_json::json!("landsat-5"));

    assert_eq!(client.count(&params).await.expect("count failed"), 0);
}

/// Full plan over the built-in policy using the blocking prober.
#[test]
#[ignore]
fn stac_plan_with_builtin_policy() {
    let prober = StacProber::new(StacConfig::default(), StacClientOptions::default())
        .expect("failed to create prober");
    let config = EngineConfig::builtin();
    let engine = CompositeEngine::new(&config, &prober);

    for year in [2005, 2015, 2020] {
        let plan = engine.plan(year, &bogota()).expect("plan failed");
        println!("{year}: {} {} ({} frames)", plan.family, plan.tier, plan.frame_count);
        assert!(plan.succeeded);
    }

    // Counts are cached per search body
    let query = FrameQuery {
        sources: vec!["LANDSAT/LE07/C02/T1_L2".into()],
        range: TimePeriod::new(2005, WindowRadius::Exact).unwrap().range(),
        region: bogota(),
        masked: true,
        options: QueryOptions::default(),
    };
    let a = prober.query_count(&query).unwrap();
    let b = prober.query_count(&query).unwrap();
    assert_eq!(a, b);
}
