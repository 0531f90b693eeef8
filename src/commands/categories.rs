use crate::api::Mode;
use crate::commands::Out;
use crate::form::category_choices;
use crate::{Config, Result};

/// Lists the categories that `add --category` accepts.
pub async fn categories(config: &Config, mode: Mode) -> Result<Out<Vec<String>>> {
    let table = crate::api::store(config, mode).await?.load_all().await?;
    let choices: Vec<String> = category_choices(&table).into_iter().collect();
    let message = if choices.is_empty() {
        "There are no categories yet, use --new-category to create one".to_string()
    } else {
        format!("Categories: {}", choices.join(", "))
    };
    Ok(Out::new(message, choices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_categories() {
        let env = TestEnv::new().await;
        let out = categories(&env.config(), Mode::Testing).await.unwrap();
        assert_eq!(
            out.structure().unwrap(),
            &vec![
                "Groceries".to_string(),
                "Leisure".to_string(),
                "Restaurants".to_string(),
                "Transport".to_string(),
                "Utilities".to_string(),
            ]
        );
    }
}
