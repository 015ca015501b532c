use std::sync::Arc;

use vcat::{
    Category, ConditionMap, ConditionRecord, ConditionRewriter, ConditionsCodec, IndexedProduct,
    InMemoryCategoryRepository, InMemoryProductIndex, ProductAttributes, ProductsList,
    SearchQuery, VcatError, WidgetParams, COMBINE_TYPE, PRODUCT_TYPE,
};

/// Conditions as the admin form saves them: `category_ids == 42` on the
/// virtual "Red" category, and `special_from_date >= 2024-01-05`.
const SAVED: &str = "^[`1`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Combine`,\
`aggregator`:`all`,`value`:`1`,`new_child`:``^],\
`1--1`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Product`,\
`attribute`:`category_ids`,`operator`:`==`,`value`:`42`^],\
`1--2`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Product`,\
`attribute`:`special_from_date`,`operator`:`>=`,`value`:`2024-01-05`^]^]";

fn catalog() -> Vec<IndexedProduct> {
    let item = |sku: &str, color: &str, from: &str, categories: Vec<i64>| {
        IndexedProduct::new(
            sku,
            ProductAttributes::new()
                .set("color", color)
                .set("special_from_date", from)
                .set("category_ids", categories),
        )
    };
    vec![
        item("A-100", "red", "2024-02-01 00:00:00", vec![8]),
        item("B-100", "blue", "2024-02-01 00:00:00", vec![9]),
        item("A-200", "red", "2023-12-01 00:00:00", vec![8]),
        item("A-300", "red", "2024-03-15 00:00:00", vec![9]),
        item("A-400", "red", "2024-04-01 00:00:00", vec![3]),
    ]
}

fn rewriter() -> Arc<ConditionRewriter> {
    let categories = InMemoryCategoryRepository::new()
        .with(Category::new(42, "Red").virtual_with(SearchQuery::term("color", "red")))
        .with(Category::new(7, "Apparel").anchor(&[8, 9]));
    let index = catalog()
        .into_iter()
        .fold(InMemoryProductIndex::new(), InMemoryProductIndex::with);
    Arc::new(
        ConditionRewriter::builder()
            .categories(categories)
            .index(index)
            .build()
            .unwrap(),
    )
}

fn skus(products: &[&IndexedProduct]) -> Vec<String> {
    products.iter().map(|p| p.sku().to_owned()).collect()
}

#[test]
fn saved_widget_renders_rewritten_rule() {
    let list = ProductsList::new(
        WidgetParams {
            conditions_encoded: Some(SAVED.to_owned()),
            ..WidgetParams::default()
        },
        rewriter(),
    );

    let rule = list.conditions(1).unwrap();
    assert_eq!(
        rule.to_string(),
        "ALL true: [(sku () A-100,A-200,A-300,A-400), (special_from_date >= 2024-01-05 00:00:00)]"
    );

    let products = catalog();
    assert_eq!(
        skus(&list.select(&rule, &products, 1)),
        vec!["A-100", "A-300", "A-400"]
    );
}

#[test]
fn paged_widget_selects_by_page() {
    let list = ProductsList::new(
        WidgetParams {
            conditions: Some(SAVED.to_owned()),
            show_pager: Some(true),
            products_per_page: Some(2),
            ..WidgetParams::default()
        },
        rewriter(),
    );
    let rule = list.conditions(1).unwrap();
    let products = catalog();

    assert_eq!(skus(&list.select(&rule, &products, 1)), vec!["A-100", "A-300"]);
    assert_eq!(skus(&list.select(&rule, &products, 2)), vec!["A-400"]);
    assert!(list.select(&rule, &products, 3).is_empty());
}

#[test]
fn anchor_widget_built_from_codec() {
    let map = ConditionMap::new()
        .with("1", ConditionRecord::combine(COMBINE_TYPE, "any", true))
        .with(
            "1--1",
            ConditionRecord::leaf(PRODUCT_TYPE, "category_ids", "==", "7"),
        );
    let list = ProductsList::new(
        WidgetParams {
            conditions_encoded: Some(ConditionsCodec.encode(&map).unwrap()),
            products_count: Some(3),
            ..WidgetParams::default()
        },
        rewriter(),
    );
    let rule = list.conditions(1).unwrap();
    let products = catalog();

    assert_eq!(
        skus(&list.select(&rule, &products, 1)),
        vec!["A-100", "B-100", "A-200"]
    );
}

#[test]
fn unknown_virtual_category_fails_render() {
    let map = ConditionMap::new().with(
        "1--1",
        ConditionRecord::leaf(PRODUCT_TYPE, "category_ids", "==", 404_i64),
    );
    let list = ProductsList::new(
        WidgetParams {
            conditions_encoded: Some(ConditionsCodec.encode(&map).unwrap()),
            ..WidgetParams::default()
        },
        rewriter(),
    );
    let err = list.conditions(1).unwrap_err();
    assert!(matches!(err, VcatError::Rewrite(_)));
    assert!(err.to_string().contains("404"));
}
