//! # Corpus Loading Tests
//!
//! Loads corpora from temporary files in both supported layouts and builds a
//! full recommender context from configuration.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pantry_match::config::AppConfig;
    use pantry_match::context::{RecommendRequest, RecommenderContext};
    use pantry_match::corpus::Corpus;
    use pantry_match::errors::AppError;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const ARRAY_CORPUS: &str = r#"[
        {"name": "Jeera Rice", "ingredients": "['1 cup basmati rice', '1 tsp jeera', '2 tbsp ghee']",
         "course": "main course", "flavor_profile": "spicy", "diet": "vegetarian"},
        {"name": "Paneer Butter Masala", "ingredients": ["200g paneer", "2 tomatoes", "butter"],
         "tags": ["North Indian", "dinner"]},
        {"name": "Pasta Pomodoro", "ingredients": "pasta, tomato, basil, olive oil",
         "tags": "italian, quick"},
        {"name": "Broken", "ingredients": 17}
    ]"#;

    #[test]
    fn test_load_json_array() {
        let file = write_temp(ARRAY_CORPUS);
        let corpus = Corpus::load(file.path(), 0).unwrap();
        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.source(), Some(file.path()));

        let jeera = corpus.get(0).unwrap();
        assert_eq!(jeera.clean_ingredients, vec!["basmati rice", "jeera", "ghee"]);
        assert_eq!(jeera.cuisine.as_deref(), Some("Indian"));
        assert_eq!(jeera.tags.as_deref(), Some("main course, spicy, vegetarian"));

        let paneer = corpus.get(1).unwrap();
        assert_eq!(paneer.clean_ingredients, vec!["paneer", "tomatoes", "butter"]);
        assert_eq!(paneer.tags.as_deref(), Some("North Indian, dinner"));
        assert_eq!(paneer.cuisine.as_deref(), Some("Indian"));

        let pasta = corpus.get(2).unwrap();
        assert_eq!(pasta.raw_ingredients.len(), 4);
        assert_eq!(pasta.cuisine.as_deref(), Some("Italian"));

        // malformed ingredients degrade to an empty list, record kept
        let broken = corpus.get(3).unwrap();
        assert!(broken.raw_ingredients.is_empty());
        assert!(broken.clean_ingredients.is_empty());
    }

    #[test]
    fn test_load_json_lines_with_limit() {
        let file = write_temp(
            "{\"name\": \"Dal\", \"ingredients\": [\"lentils\", \"salt\"]}\n\
             {\"name\": \"Roti\", \"ingredients\": [\"atta\", \"water\"]}\n\
             {\"name\": \"Chai\", \"ingredients\": [\"milk\", \"tea\"]}\n",
        );
        let corpus = Corpus::load(file.path(), 2).unwrap();
        let names: Vec<_> = corpus.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Dal", "Roti"]);
    }

    #[test]
    fn test_load_errors() {
        let missing = Corpus::load("/definitely/not/here.json", 0);
        assert!(matches!(missing, Err(AppError::FileSystem(_))));

        let file = write_temp("{\"name\": \"Dal\"}\nnot json\n");
        assert!(matches!(Corpus::load(file.path(), 0), Err(AppError::Corpus(_))));

        let file = write_temp("[\"Dal\", {\"name\": \"Roti\"}]");
        assert!(matches!(Corpus::load(file.path(), 0), Err(AppError::Corpus(_))));
    }

    #[test]
    fn test_unnamed_record_is_kept() {
        let file = write_temp(
            "{\"name\": \"Dal\", \"ingredients\": [\"lentils\"]}\n\
             {\"ingredients\": [\"rice\"]}\n",
        );
        let corpus = Corpus::load(file.path(), 0).unwrap();
        assert_eq!(corpus.len(), 2);
        let unnamed = corpus.get(1).unwrap();
        assert_eq!(unnamed.name, "");
        assert_eq!(unnamed.clean_ingredients, vec!["rice"]);
    }

    #[test]
    fn test_empty_file_is_an_empty_corpus() {
        let file = write_temp("   \n");
        let corpus = Corpus::load(file.path(), 0).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_context_from_config_end_to_end() {
        let file = write_temp(ARRAY_CORPUS);
        let mut config = AppConfig::default();
        config.corpus.path = file.path().display().to_string();
        config.embedding.dimensions = 128;

        let context = RecommenderContext::from_config(&config).unwrap();
        assert_eq!(context.health().recipes_loaded, 4);

        let response = context
            .recommend(&RecommendRequest {
                ingredients: vec!["Rice".into(), "cumin".into(), "clarified butter".into()],
                top_n: Some(3),
                max_missing: Some(0),
            })
            .unwrap();

        assert_eq!(response.recipes.len(), 1);
        let jeera = &response.recipes[0];
        assert_eq!(jeera.result.name, "Jeera Rice");
        assert_eq!(jeera.result.present, vec!["basmati rice", "jeera(sub->cumin)", "ghee(sub->clarified butter)"]);
        assert_eq!(jeera.match_percentage, 100);
        assert_eq!(jeera.extras["region"], "India");
        assert!(jeera.extras.contains_key("image_prompt"));

        let found = context.search_by_name("MASALA", 10);
        assert_eq!(found.len(), 1);
    }
}
