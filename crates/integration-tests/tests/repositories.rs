//! Repository rules that need a real database.
//!
//! Run against a migrated database:
//!
//! ```bash
//! SITE_DATABASE_URL=postgres://... cargo test -p faqbase-integration-tests --test repositories -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use faqbase_integration_tests::database_pool;
use faqbase_site::db::{CategoryRepository, FaqRepository, RepositoryError};
use faqbase_site::models::{Category, CategoryInput, FaqInput};

fn category_input(name: &str, parent: Option<&Category>) -> CategoryInput {
    CategoryInput {
        lang: "en".to_string(),
        parent_id: parent.map(|c| c.id),
        name: name.to_string(),
        description: String::new(),
        active: true,
        show_home: true,
        position: 0,
    }
}

fn faq_input(question: &str, answer: &str, category: &Category) -> FaqInput {
    FaqInput {
        lang: "en".to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        keywords: "billing".to_string(),
        author: "Integration Tests".to_string(),
        email: String::new(),
        active: true,
        sticky: false,
        comments_enabled: true,
        valid_from: None,
        valid_until: None,
        categories: vec![category.id],
        tags: Vec::new(),
    }
}

#[tokio::test]
#[ignore = "Requires database (SITE_DATABASE_URL)"]
async fn test_update_archives_revision() {
    let pool = database_pool().await;
    let categories = CategoryRepository::new(&pool);
    let faqs = FaqRepository::new(&pool);

    let category = categories
        .create(&category_input("Revision tests", None))
        .await
        .unwrap();
    let created = faqs
        .create(&faq_input("How do I pay?", "By card.", &category))
        .await
        .unwrap();

    let updated = faqs
        .update(created.id, &faq_input("How do I pay?", "By card or invoice.", &category))
        .await
        .unwrap();
    assert_eq!(updated.revision_id, created.revision_id + 1);
    assert_eq!(updated.answer, "By card or invoice.");

    let revisions = faqs.revisions(created.id).await.unwrap();
    assert_eq!(revisions.len(), 1);
    let archived = revisions.first().unwrap();
    assert_eq!(archived.revision_id, created.revision_id);
    assert_eq!(archived.answer, "By card.");

    faqs.update(created.id, &faq_input("How do I pay?", "Invoice only.", &category))
        .await
        .unwrap();
    let revisions = faqs.revisions(created.id).await.unwrap();
    assert_eq!(
        revisions.iter().map(|r| r.revision_id).collect::<Vec<_>>(),
        vec![created.revision_id + 1, created.revision_id]
    );

    faqs.delete(created.id).await.unwrap();
    categories.delete(category.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires database (SITE_DATABASE_URL)"]
async fn test_category_in_use_is_not_deleted() {
    let pool = database_pool().await;
    let categories = CategoryRepository::new(&pool);
    let faqs = FaqRepository::new(&pool);

    let parent = categories
        .create(&category_input("Delete guard", None))
        .await
        .unwrap();
    let child = categories
        .create(&category_input("Delete guard child", Some(&parent)))
        .await
        .unwrap();

    let err = categories.delete(parent.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let faq = faqs
        .create(&faq_input("Where is my invoice?", "In your account.", &child))
        .await
        .unwrap();
    let err = categories.delete(child.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(categories.get(child.id).await.unwrap().is_some());

    faqs.delete(faq.id).await.unwrap();
    categories.delete(child.id).await.unwrap();
    categories.delete(parent.id).await.unwrap();
    assert!(categories.get(parent.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires database (SITE_DATABASE_URL)"]
async fn test_category_cannot_move_below_itself() {
    let pool = database_pool().await;
    let categories = CategoryRepository::new(&pool);

    let root = categories
        .create(&category_input("Move root", None))
        .await
        .unwrap();
    let child = categories
        .create(&category_input("Move child", Some(&root)))
        .await
        .unwrap();
    let grandchild = categories
        .create(&category_input("Move grandchild", Some(&child)))
        .await
        .unwrap();

    let err = categories
        .update(root.id, &category_input("Move root", Some(&grandchild)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let err = categories
        .update(root.id, &category_input("Move root", Some(&root)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    // Moving a leaf under a sibling branch is fine.
    let moved = categories
        .update(grandchild.id, &category_input("Move grandchild", Some(&root)))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(root.id));

    categories.delete(grandchild.id).await.unwrap();
    categories.delete(child.id).await.unwrap();
    categories.delete(root.id).await.unwrap();
}
