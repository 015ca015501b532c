use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcat::{
    Category, ConditionRewriter, IndexedProduct, InMemoryCategoryRepository,
    InMemoryProductIndex, ProductAttributes, ProductsList, SearchQuery, WidgetParams,
};

/// Conditions as saved by the widget admin form: products in the virtual
/// category 42 or in the anchor category 7, on special price since January.
const SAVED: &str = "^[`1`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Combine`,`aggregator`:`all`,`value`:`1`^],`1--1`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Combine`,`aggregator`:`any`,`value`:`1`^],`1--1--1`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Product`,`attribute`:`category_ids`,`operator`:`==`,`value`:`42`^],`1--1--2`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Product`,`attribute`:`category_ids`,`operator`:`==`,`value`:`7`^],`1--2`:^[`type`:`Magento||CatalogWidget||Model||Rule||Condition||Product`,`attribute`:`special_from_date`,`operator`:`>=`,`value`:`01/01/2024`^]^]";

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let products = vec![
        product("TEE-RED", "red", 8, "2024-02-01 00:00:00"),
        product("TEE-BLUE", "blue", 8, "2024-03-01 00:00:00"),
        product("MUG-RED", "red", 3, "2024-01-20 00:00:00"),
        product("MUG-BLUE", "blue", 3, "2024-01-20 00:00:00"),
        product("JEANS", "indigo", 9, "2023-11-11 00:00:00"),
    ];

    let categories = InMemoryCategoryRepository::new()
        .with(Category::new(42, "Red picks").virtual_with(SearchQuery::term("color", "red")))
        .with(Category::new(7, "Apparel").anchor(&[8, 9]))
        .with(Category::new(8, "Tees"))
        .with(Category::new(9, "Jeans"));
    let index = products
        .iter()
        .cloned()
        .fold(InMemoryProductIndex::new(), InMemoryProductIndex::with);

    let rewriter = ConditionRewriter::builder()
        .categories(categories)
        .index(index)
        .build()
        .expect("catalog collaborators are set");

    let list = ProductsList::new(
        WidgetParams {
            conditions_encoded: Some(SAVED.to_owned()),
            products_count: Some(3),
            ..WidgetParams::default()
        },
        rewriter,
    );

    let rule = match list.conditions(1) {
        Ok(rule) => rule,
        Err(err) => {
            eprintln!("cannot render widget: {err}");
            std::process::exit(1);
        }
    };
    println!("Rule: {rule}");

    for product in list.select(&rule, &products, 1) {
        println!("  {}", product.sku());
    }
}

fn product(sku: &str, color: &str, category: i64, special_from: &str) -> IndexedProduct {
    IndexedProduct::new(
        sku,
        ProductAttributes::new()
            .set("color", color)
            .set("category_ids", vec![category])
            .set("special_from_date", special_from),
    )
}
