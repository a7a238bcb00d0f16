//! End-to-end association rewrites against a file-backed database
use std::sync::Arc;

use memberships_admin_lib::application::{AssociationUseCases, ProductItemUseCases};
use memberships_admin_lib::domain::{
    AdminError, AssociationRepository, CatalogRepository, ChangeRequest, Eligibility, Item, ItemId,
    PairLocks, Product, ProductId, ProductItem, ProductLinkText, ProductLinkTextId, ProductType,
    ProductTypeId, RewriteError, RewriteOutcome,
};
use memberships_admin_lib::infrastructure::{
    DatabaseConfig, DatabaseConnection, SqliteAssociationRepository, SqliteCatalogRepository,
};
use tempfile::TempDir;

struct Fixture {
    config: DatabaseConfig,
    catalog: Arc<dyn CatalogRepository>,
    links: Arc<dyn AssociationRepository<ProductItem>>,
    _dir: TempDir,
}

impl Fixture {
    async fn open(dir: TempDir) -> Fixture {
        let config = DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("admin.db").display()),
            max_connections: 4,
            ..DatabaseConfig::default()
        };
        let db = DatabaseConnection::with_config(&config).await.expect("open database");
        db.migrate().await.expect("migrate");

        Fixture {
            catalog: Arc::new(SqliteCatalogRepository::new(db.pool().clone())),
            links: Arc::new(SqliteAssociationRepository::<ProductItem>::new(db.pool().clone())),
            config,
            _dir: dir,
        }
    }

    async fn seeded() -> Fixture {
        let fixture = Fixture::open(tempfile::tempdir().expect("tempdir")).await;
        let catalog = &fixture.catalog;

        catalog
            .save_link_text(&ProductLinkText { id: ProductLinkTextId(1), title: "Buy now".into() })
            .await
            .unwrap();
        catalog
            .save_product_type(&ProductType { id: ProductTypeId(1), title: "Course".into() })
            .await
            .unwrap();
        catalog
            .save_product(&Product {
                id: ProductId(1),
                title: "Beginner Course".into(),
                description: String::new(),
                image_url: String::new(),
                product_link_text_id: ProductLinkTextId(1),
                product_type_id: ProductTypeId(1),
            })
            .await
            .unwrap();

        for id in 1..=6 {
            catalog
                .save_item(&Item {
                    id: ItemId(id),
                    title: format!("Lesson {id}"),
                    description: String::new(),
                    url: format!("/lessons/{id}"),
                    image_url: String::new(),
                    is_free: id == 1,
                })
                .await
                .unwrap();
        }

        fixture
    }

    fn use_cases(&self, locks: Option<PairLocks>) -> ProductItemUseCases {
        AssociationUseCases::new(self.catalog.clone(), self.links.clone(), locks)
    }
}

fn link(product: i64, item: i64) -> ProductItem {
    ProductItem::new(ProductId(product), ItemId(item))
}

#[tokio::test]
async fn rewrite_is_applied_and_persisted() {
    let fixture = Fixture::seeded().await;
    let use_cases = fixture.use_cases(Some(PairLocks::new()));
    use_cases.create(&link(1, 1)).await.unwrap();

    let request = ChangeRequest::new(link(1, 1), link(1, 2));
    assert!(use_cases.can_edit(&request).await.unwrap());
    assert_eq!(use_cases.edit(&request).await.unwrap(), RewriteOutcome::Applied);

    // A fresh pool sees the committed swap
    let reopened = DatabaseConnection::with_config(&fixture.config).await.unwrap();
    let links = SqliteAssociationRepository::<ProductItem>::new(reopened.pool().clone());
    assert_eq!(links.count(&link(1, 1)).await.unwrap(), 0);
    assert_eq!(links.count(&link(1, 2)).await.unwrap(), 1);

    let listed = use_cases.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_title.as_deref(), Some("Lesson 2"));
}

#[tokio::test]
async fn rewrite_of_missing_link_changes_nothing() {
    let fixture = Fixture::seeded().await;
    let use_cases = fixture.use_cases(None);
    use_cases.create(&link(1, 3)).await.unwrap();

    let request = ChangeRequest::new(link(1, 1), link(1, 2));
    assert!(!use_cases.can_edit(&request).await.unwrap());
    assert_eq!(
        use_cases.edit(&request).await.unwrap(),
        RewriteOutcome::NotApplied(Eligibility::CurrentMissing)
    );
    assert_eq!(fixture.links.find_all().await.unwrap(), vec![link(1, 3)]);
}

#[tokio::test]
async fn failed_insert_rolls_back_the_delete() {
    let fixture = Fixture::seeded().await;
    let use_cases = fixture.use_cases(None);
    use_cases.create(&link(1, 1)).await.unwrap();

    let request = ChangeRequest::new(link(1, 1), link(1, 404));
    let error = use_cases.edit(&request).await.unwrap_err();

    assert!(matches!(error, AdminError::Rewrite(RewriteError::Swap { .. })));
    assert_eq!(fixture.links.find_all().await.unwrap(), vec![link(1, 1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rewrites_of_one_link_apply_once() {
    let fixture = Fixture::seeded().await;
    let use_cases = Arc::new(fixture.use_cases(Some(PairLocks::new())));
    use_cases.create(&link(1, 1)).await.unwrap();

    let tasks: Vec<_> = (2..=6)
        .map(|item| {
            let use_cases = Arc::clone(&use_cases);
            tokio::spawn(async move {
                use_cases
                    .edit(&ChangeRequest::new(link(1, 1), link(1, item)))
                    .await
            })
        })
        .collect();

    let mut applied = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_applied() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    let remaining = fixture.links.find_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0], link(1, 1));
}
