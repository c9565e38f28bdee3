//! Prompt sent to chat-style extraction models.

/// Reference child portions given to the model: (food, quantity, unit)
pub const REFERENCE_PORTIONS: [(&str, u32, &str); 8] = [
    ("arroz", 60, "g"),
    ("feijão", 50, "g"),
    ("frango/carne", 50, "g"),
    ("leite", 150, "ml"),
    ("fruta", 80, "g"),
    ("legumes", 40, "g"),
    ("pão", 25, "g"),
    ("suco", 100, "ml"),
];

/// System instructions for ingredient extraction
pub fn build_system_prompt() -> String {
    let portions = REFERENCE_PORTIONS
        .iter()
        .map(|(food, quantity, unit)| format!("- {food}: {quantity}{unit}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Você é um nutricionista infantil que analisa descrições de refeições servidas em creches.

Regras:
1. Separe pratos compostos nos alimentos que os compõem (ex.: "arroz com feijão" vira arroz e feijão).
2. Estime a quantidade de cada alimento para uma porção infantil, em gramas (g) ou mililitros (ml), usando estas porções de referência:
{portions}
3. Use nomes curtos em português, como aparecem na Tabela TACO (ex.: "Arroz", "Feijão carioca", "Frango grelhado").
4. Use "un" apenas para alimentos contados por unidade (ex.: ovo).

Responda SOMENTE com um array JSON, sem nenhum outro texto:
[{{"name": "Arroz", "quantity": 60, "unit": "g"}}, {{"name": "Leite", "quantity": 150, "unit": "ml"}}]"#
    )
}

/// User message carrying the meal description
pub fn build_user_message(meal_description: &str) -> String {
    format!("Refeição: {}", meal_description.trim())
}
