// ABOUTME: Integration tests for building and pushing a domain's complete DNS record set.
// ABOUTME: Includes property tests for uniqueness, preservation, and idempotence of merges.

mod support;

use std::sync::Arc;

use proptest::prelude::*;
use sitesmith::dns::{
    DnsReconciler, DnsRecord, DnsRecordSet, ReconcileError, RecordType, build_record_set,
};
use sitesmith::registry::{MemoryRegistry, NewSite, SiteRecord};
use sitesmith::types::{DatabaseId, ProjectId, Subdomain};
use support::fakes::{self, FakeDns};

fn site(subdomain: &str) -> SiteRecord {
    NewSite {
        owner: "user-1".to_string(),
        subdomain: Subdomain::new(subdomain).unwrap(),
        domain: fakes::domain(),
        url: format!("https://{subdomain}.example.com"),
        repository_url: format!("https://github.com/sites-org/{subdomain}"),
        project_id: ProjectId::new(format!("prj_{subdomain}")),
        database_id: DatabaseId::new(format!("db-{subdomain}")),
    }
    .into_record()
}

fn reconciler(sites: Vec<SiteRecord>, include_live: bool) -> DnsReconciler {
    let mut settings = fakes::reconcile_settings();
    settings.include_live_records = include_live;
    DnsReconciler::new(Arc::new(MemoryRegistry::with_sites(sites)), settings)
}

fn hosts(set: &DnsRecordSet) -> Vec<&str> {
    set.host_names().collect()
}

mod reconcile {
    use super::*;

    #[tokio::test]
    async fn first_site_adds_one_record_to_defaults() {
        support::init_tracing();
        let reconciler = reconciler(Vec::new(), false);
        let dns = FakeDns::default();
        let domain = fakes::domain();
        let record = reconciler.subdomain_record(&domain, &Subdomain::new("acme").unwrap());

        let set = reconciler
            .reconcile_and_push(&dns, &domain, Some(record))
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "acme"]);
        let acme = set.get("acme").unwrap();
        assert_eq!(acme.record_type, RecordType::Cname);
        assert_eq!(acme.address, fakes::CNAME_TARGET);
        assert_eq!(acme.ttl, 300);

        assert_eq!(dns.push_count(), 1);
        assert_eq!(dns.last_push().unwrap(), set);
    }

    #[tokio::test]
    async fn registry_sites_are_rebuilt_in_order() {
        let reconciler = reconciler(vec![site("bolt"), site("crane")], false);
        let dns = FakeDns::default();
        let domain = fakes::domain();
        let record = reconciler.subdomain_record(&domain, &Subdomain::new("acme").unwrap());

        let set = reconciler
            .reconcile_and_push(&dns, &domain, Some(record))
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "bolt", "crane", "acme"]);
        assert_eq!(dns.push_count(), 1);
    }

    #[tokio::test]
    async fn upsert_for_known_host_replaces_in_place() {
        let reconciler = reconciler(vec![site("acme"), site("bolt")], false);
        let domain = fakes::domain();
        let moved = DnsRecord::new("acme", RecordType::A, "203.0.113.7", 600);

        let set = reconciler
            .reconcile_offline(&domain, Some(moved.clone()))
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "acme", "bolt"]);
        assert_eq!(set.get("acme"), Some(&moved));
    }

    #[tokio::test]
    async fn sync_without_upsert_pushes_baseline() {
        let reconciler = reconciler(vec![site("bolt")], false);
        let dns = FakeDns::default();

        let set = reconciler
            .reconcile_and_push(&dns, &fakes::domain(), None)
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "bolt"]);
    }

    #[tokio::test]
    async fn live_records_only_fill_gaps() {
        let reconciler = reconciler(vec![site("bolt")], true);
        let dns = FakeDns {
            live: vec![
                DnsRecord::new("www", RecordType::A, "10.0.0.1", 60),
                DnsRecord::new("bolt", RecordType::A, "10.0.0.2", 60),
                DnsRecord::new("mail", RecordType::Mx, "mx.example.net", 1800),
            ],
            ..FakeDns::default()
        };

        let set = reconciler
            .reconcile(&dns, &fakes::domain(), None)
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "bolt", "mail"]);
        assert_eq!(set.get("www").unwrap().address, fakes::CNAME_TARGET);
        assert_eq!(set.get("bolt").unwrap().address, fakes::CNAME_TARGET);
    }

    #[tokio::test]
    async fn live_records_are_not_read_unless_enabled() {
        let reconciler = reconciler(Vec::new(), false);
        let dns = FakeDns {
            live: vec![DnsRecord::new("mail", RecordType::Mx, "mx.example.net", 1800)],
            ..FakeDns::default()
        };

        let set = reconciler
            .reconcile(&dns, &fakes::domain(), None)
            .await
            .unwrap();

        assert!(!set.contains("mail"));
    }

    #[tokio::test]
    async fn failed_live_read_is_ignored() {
        let reconciler = reconciler(vec![site("bolt")], true);
        let dns = FakeDns {
            fail_get: true,
            ..FakeDns::default()
        };

        let set = reconciler
            .reconcile_and_push(&dns, &fakes::domain(), None)
            .await
            .unwrap();

        assert_eq!(hosts(&set), vec!["@", "www", "bolt"]);
        assert_eq!(dns.push_count(), 1);
    }

    #[tokio::test]
    async fn failed_push_names_the_domain() {
        let reconciler = reconciler(Vec::new(), false);
        let dns = FakeDns {
            fail_set: true,
            ..FakeDns::default()
        };

        let err = reconciler
            .reconcile_and_push(&dns, &fakes::domain(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Push { ref domain, .. } if domain.as_str() == "example.com"));
        assert_eq!(dns.push_count(), 0);
    }
}

mod properties {
    use super::*;

    fn record_type() -> impl Strategy<Value = RecordType> {
        prop_oneof![
            Just(RecordType::A),
            Just(RecordType::Aaaa),
            Just(RecordType::Cname),
            Just(RecordType::Txt),
            Just(RecordType::Mx),
        ]
    }

    fn record() -> impl Strategy<Value = DnsRecord> {
        ("[a-z]{1,5}|@", record_type(), "[a-z0-9.]{1,12}", 60u32..3600)
            .prop_map(|(host, kind, address, ttl)| DnsRecord::new(host, kind, address, ttl))
    }

    fn records(max: usize) -> impl Strategy<Value = Vec<DnsRecord>> {
        prop::collection::vec(record(), 0..max)
    }

    proptest! {
        #[test]
        fn host_names_are_unique(
            defaults in records(4),
            baseline in records(8),
            live in records(6),
            upsert in prop::option::of(record()),
        ) {
            let set = build_record_set(&fakes::domain(), &defaults, baseline, &live, upsert);
            let mut seen: Vec<String> = set.host_names().map(str::to_string).collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }

        #[test]
        fn every_known_host_survives(
            defaults in records(4),
            baseline in records(8),
            live in records(6),
            upsert in prop::option::of(record()),
        ) {
            let set = build_record_set(&fakes::domain(), &defaults, baseline.clone(), &live, upsert.clone());
            for record in defaults.iter().chain(&baseline).chain(&live).chain(upsert.iter()) {
                prop_assert!(set.contains(&record.host_name), "{} was dropped", record.host_name);
            }
        }

        #[test]
        fn upsert_wins_over_everything(
            defaults in records(4),
            baseline in records(8),
            live in records(6),
            upsert in record(),
        ) {
            let set = build_record_set(&fakes::domain(), &defaults, baseline, &live, Some(upsert.clone()));
            prop_assert_eq!(set.get(&upsert.host_name), Some(&upsert));
        }

        #[test]
        fn reapplying_the_same_upsert_changes_nothing(
            defaults in records(4),
            baseline in records(8),
            upsert in prop::option::of(record()),
        ) {
            let domain = fakes::domain();
            let once = build_record_set(&domain, &defaults, baseline, &[], upsert.clone());
            let twice = build_record_set(&domain, &[], once.records().to_vec(), &[], upsert);
            prop_assert_eq!(once, twice);
        }
    }
}
