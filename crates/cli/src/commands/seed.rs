//! Demo content for a fresh installation.

use std::collections::HashMap;

use faqbase_core::{CategoryId, LanguageCode};
use faqbase_site::db::{CategoryRepository, FaqRepository};
use faqbase_site::models::{CategoryInput, FaqInput};

use super::{CliError, connect};

struct SeedCategory {
    name: &'static str,
    parent: Option<&'static str>,
    description: &'static str,
}

struct SeedFaq {
    category: &'static str,
    question: &'static str,
    answer: &'static str,
    keywords: &'static str,
    tags: &'static [&'static str],
    sticky: bool,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Getting started",
        parent: None,
        description: "First steps with the knowledge base.",
    },
    SeedCategory {
        name: "Accounts",
        parent: None,
        description: "Registration, login and profile questions.",
    },
    SeedCategory {
        name: "Passwords",
        parent: Some("Accounts"),
        description: "Resetting and changing passwords.",
    },
];

const FAQS: &[SeedFaq] = &[
    SeedFaq {
        category: "Getting started",
        question: "What is this knowledge base?",
        answer: "A collection of **frequently asked questions**. Browse the categories or use the search box at the top of every page.",
        keywords: "intro overview",
        tags: &["introduction"],
        sticky: true,
    },
    SeedFaq {
        category: "Getting started",
        question: "How do I search for an answer?",
        answer: "Type a few words into the search box. Results match questions, answers and keywords; the most relevant appear first.",
        keywords: "search find",
        tags: &["search", "introduction"],
        sticky: false,
    },
    SeedFaq {
        category: "Accounts",
        question: "How do I register an account?",
        answer: "Use the *Register* link in the header. New accounts are reviewed and activated by an administrator.",
        keywords: "sign up registration",
        tags: &["account"],
        sticky: false,
    },
    SeedFaq {
        category: "Passwords",
        question: "I forgot my password. What now?",
        answer: "Contact an administrator, who can set a new password for your account.",
        keywords: "reset forgot",
        tags: &["account", "password"],
        sticky: false,
    },
];

fn faq_input(faq: &SeedFaq, lang: &str, category: CategoryId) -> FaqInput {
    FaqInput {
        lang: lang.to_owned(),
        question: faq.question.to_owned(),
        answer: faq.answer.to_owned(),
        keywords: faq.keywords.to_owned(),
        author: "faqbase".to_owned(),
        email: String::new(),
        active: true,
        sticky: faq.sticky,
        comments_enabled: true,
        valid_from: None,
        valid_until: None,
        categories: vec![category],
        tags: faq.tags.iter().map(|t| (*t).to_owned()).collect(),
    }
}

/// Insert the demo categories and FAQs. Does nothing if any category
/// exists.
///
/// # Errors
///
/// Returns an error for an invalid language or a database failure.
pub async fn run(lang: &str) -> Result<(), CliError> {
    let lang = LanguageCode::parse(lang).map_err(|e| CliError::Invalid(e.to_string()))?;
    let pool = connect().await?;

    let categories = CategoryRepository::new(&pool);
    if !categories.list(None, false).await?.is_empty() {
        tracing::warn!("Database already has categories, skipping seed");
        return Ok(());
    }

    let mut ids: HashMap<&str, CategoryId> = HashMap::new();
    for (position, seed) in (0_i32..).zip(CATEGORIES) {
        let parent_id = seed.parent.and_then(|name| ids.get(name).copied());
        let category = categories
            .create(&CategoryInput {
                lang: lang.to_string(),
                parent_id,
                name: seed.name.to_owned(),
                description: seed.description.to_owned(),
                active: true,
                show_home: true,
                position,
            })
            .await?;
        ids.insert(seed.name, category.id);
    }

    let faqs = FaqRepository::new(&pool);
    for seed in FAQS {
        let category = ids
            .get(seed.category)
            .copied()
            .ok_or_else(|| CliError::Invalid(format!("unknown seed category {}", seed.category)))?;
        faqs.create(&faq_input(seed, lang.as_str(), category)).await?;
    }

    tracing::info!(categories = CATEGORIES.len(), faqs = FAQS.len(), "Seeded demo content");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_categories_reference_earlier_parents() {
        for (index, category) in CATEGORIES.iter().enumerate() {
            if let Some(parent) = category.parent {
                assert!(
                    CATEGORIES.iter().take(index).any(|c| c.name == parent),
                    "{} is seeded before its parent",
                    category.name
                );
            }
        }
    }

    #[test]
    fn test_seed_faqs_are_valid() {
        for faq in FAQS {
            assert!(CATEGORIES.iter().any(|c| c.name == faq.category));
            assert_eq!(faq_input(faq, "en", CategoryId::new(1)).validate(), Ok(()));
        }
    }
}
