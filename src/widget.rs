use serde::{Deserialize, Serialize};

use crate::codec::ConditionsCodec;
use crate::{Combine, IndexedProduct, Rewrite, StoreId, VcatError};

pub const DEFAULT_PRODUCTS_COUNT: usize = 10;
pub const DEFAULT_PRODUCTS_PER_PAGE: usize = 5;
pub const DEFAULT_SHOW_PAGER: bool = false;
pub const DEFAULT_PAGE_VAR_NAME: &str = "np";

/// Parameters of a product list widget instance, as stored with the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_encoded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_per_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_pager: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_var_name: Option<String>,
}

/// A product list widget: its parameters plus the rewriter that turns its
/// stored conditions into an evaluable rule.
#[derive(Debug)]
pub struct ProductsList<W> {
    params: WidgetParams,
    rewriter: W,
    codec: ConditionsCodec,
}

impl<W: Rewrite> ProductsList<W> {
    pub fn new(params: WidgetParams, rewriter: W) -> Self {
        Self {
            params,
            rewriter,
            codec: ConditionsCodec,
        }
    }

    #[must_use]
    pub fn params(&self) -> &WidgetParams {
        &self.params
    }

    /// The widget's rule for `store`, with virtual and anchor categories
    /// rewritten away.
    ///
    /// `conditions_encoded` takes precedence over `conditions`; a widget with
    /// neither selects every product.
    ///
    /// # Errors
    ///
    /// Returns [`VcatError::Codec`] if the stored conditions cannot be
    /// decoded and [`VcatError::Rewrite`] if rewriting fails.
    pub fn conditions(&self, store: StoreId) -> Result<Combine, VcatError> {
        let raw = self
            .params
            .conditions_encoded
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .or(self.params.conditions.as_deref())
            .unwrap_or_default();
        let decoded = self.codec.decode(raw)?;
        Ok(self.rewriter.rewrite(&decoded, store)?)
    }

    #[must_use]
    pub fn products_count(&self) -> usize {
        self.params.products_count.unwrap_or(DEFAULT_PRODUCTS_COUNT)
    }

    #[must_use]
    pub fn products_per_page(&self) -> usize {
        self.params
            .products_per_page
            .unwrap_or(DEFAULT_PRODUCTS_PER_PAGE)
    }

    #[must_use]
    pub fn show_pager(&self) -> bool {
        self.params.show_pager.unwrap_or(DEFAULT_SHOW_PAGER)
    }

    #[must_use]
    pub fn page_var_name(&self) -> &str {
        self.params
            .page_var_name
            .as_deref()
            .unwrap_or(DEFAULT_PAGE_VAR_NAME)
    }

    /// Products shown per page: the per-page setting when paging, otherwise
    /// the total count.
    #[must_use]
    pub fn page_size(&self) -> usize {
        if self.show_pager() {
            self.products_per_page()
        } else {
            self.products_count()
        }
    }

    /// The products on `page` (1-based) that satisfy `rule`, in input order.
    /// Never returns more than [`products_count`](Self::products_count) in
    /// total across pages.
    pub fn select<'a>(
        &self,
        rule: &Combine,
        products: &'a [IndexedProduct],
        page: usize,
    ) -> Vec<&'a IndexedProduct> {
        let size = self.page_size();
        let skip = page.saturating_sub(1).saturating_mul(size);
        products
            .iter()
            .filter(|p| rule.validate(p.attributes()))
            .take(self.products_count())
            .skip(skip)
            .take(size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        load_post, ConditionMap, ConditionRecord, ProductAttributes, RewriteError,
        COMBINE_TYPE, PRODUCT_TYPE,
    };

    /// Loads conditions without touching any catalog.
    struct Passthrough;

    impl Rewrite for Passthrough {
        fn rewrite(
            &self,
            conditions: &ConditionMap,
            _store: StoreId,
        ) -> Result<Combine, RewriteError> {
            Ok(load_post(conditions)?)
        }
    }

    fn products(n: usize) -> Vec<IndexedProduct> {
        (0..n)
            .map(|i| {
                IndexedProduct::new(
                    &format!("P-{i}"),
                    ProductAttributes::new().set("even", i64::from(i % 2 == 0)),
                )
            })
            .collect()
    }

    #[test]
    fn defaults() {
        let list = ProductsList::new(WidgetParams::default(), Passthrough);
        assert_eq!(list.products_count(), 10);
        assert_eq!(list.products_per_page(), 5);
        assert!(!list.show_pager());
        assert_eq!(list.page_var_name(), "np");
        assert_eq!(list.page_size(), 10);
    }

    #[test]
    fn params_deserialize() {
        let params: WidgetParams = serde_json::from_str(
            r#"{"products_count": 4, "show_pager": true, "products_per_page": 2}"#,
        )
        .unwrap();
        let list = ProductsList::new(params, Passthrough);
        assert_eq!(list.page_size(), 2);
        assert_eq!(list.products_count(), 4);
    }

    #[test]
    fn no_conditions_selects_everything() {
        let list = ProductsList::new(WidgetParams::default(), Passthrough);
        let rule = list.conditions(1).unwrap();
        assert_eq!(list.select(&rule, &products(3), 1).len(), 3);
    }

    #[test]
    fn encoded_conditions_take_precedence() {
        let even = ConditionMap::new()
            .with("1", ConditionRecord::combine(COMBINE_TYPE, "all", true))
            .with("1--1", ConditionRecord::leaf(PRODUCT_TYPE, "even", "==", 1_i64));
        let params = WidgetParams {
            conditions_encoded: Some(ConditionsCodec.encode(&even).unwrap()),
            conditions: Some("garbage that is never decoded".into()),
            ..WidgetParams::default()
        };
        let list = ProductsList::new(params, Passthrough);
        let rule = list.conditions(1).unwrap();
        let catalog = products(5);
        let skus: Vec<&str> = list
            .select(&rule, &catalog, 1)
            .iter()
            .map(|p| p.sku())
            .collect();
        assert_eq!(skus, vec!["P-0", "P-2", "P-4"]);
    }

    #[test]
    fn malformed_conditions_surface_codec_error() {
        let params = WidgetParams {
            conditions: Some("[`1`:".into()),
            ..WidgetParams::default()
        };
        let list = ProductsList::new(params, Passthrough);
        assert!(matches!(list.conditions(1), Err(VcatError::Codec(_))));
    }

    #[test]
    fn paging_is_capped_by_count() {
        let params = WidgetParams {
            products_count: Some(7),
            products_per_page: Some(3),
            show_pager: Some(true),
            ..WidgetParams::default()
        };
        let list = ProductsList::new(params, Passthrough);
        let rule = Combine::match_all(COMBINE_TYPE);
        let all = products(20);
        assert_eq!(list.select(&rule, &all, 1).len(), 3);
        assert_eq!(list.select(&rule, &all, 2).len(), 3);
        assert_eq!(list.select(&rule, &all, 3).len(), 1);
        assert!(list.select(&rule, &all, 4).is_empty());
    }
}
