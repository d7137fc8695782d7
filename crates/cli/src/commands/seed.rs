//! Seed the catalog with sample pharmacy products.

use rust_decimal::Decimal;
use tracing::info;

use pharmacorp_storefront::db::ProductRepository;
use pharmacorp_storefront::models::NewProduct;

use super::connect;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    category: &'static str,
    image: &'static str,
    quantity: i32,
}

const CATALOG: [SeedProduct; 8] = [
    SeedProduct {
        name: "CardioGuard Plus",
        description: "Advanced cardiovascular support formula with omega-3 fatty acids and CoQ10 for heart health.",
        price_cents: 4999,
        category: "Heart Health",
        image: "/products/cardioguard.jpg",
        quantity: 100,
    },
    SeedProduct {
        name: "ImmunoBoost Pro",
        description: "Comprehensive immune system support with Vitamin C, D3, Zinc, and Elderberry extract.",
        price_cents: 3499,
        category: "Immunity",
        image: "/products/immunoboost.jpg",
        quantity: 150,
    },
    SeedProduct {
        name: "NeuroCalm",
        description: "Natural stress relief and cognitive support with Ashwagandha, L-Theanine, and B-vitamins.",
        price_cents: 4299,
        category: "Mental Wellness",
        image: "/products/neurocalm.jpg",
        quantity: 80,
    },
    SeedProduct {
        name: "JointFlex Advanced",
        description: "Premium joint support with Glucosamine, Chondroitin, MSM, and Turmeric for mobility.",
        price_cents: 5499,
        category: "Joint Health",
        image: "/products/jointflex.jpg",
        quantity: 60,
    },
    SeedProduct {
        name: "DigestEase",
        description: "Probiotic blend with digestive enzymes for optimal gut health and nutrient absorption.",
        price_cents: 2999,
        category: "Digestive Health",
        image: "/products/digestease.jpg",
        quantity: 200,
    },
    SeedProduct {
        name: "VitaWell Complete",
        description: "Daily multivitamin with essential minerals for overall health and vitality.",
        price_cents: 2499,
        category: "General Wellness",
        image: "/products/vitawell.jpg",
        quantity: 0,
    },
    SeedProduct {
        name: "SleepSerene",
        description: "Natural sleep aid with Melatonin, Valerian Root, and Magnesium for restful nights.",
        price_cents: 2799,
        category: "Sleep Support",
        image: "/products/sleepserene.jpg",
        quantity: 120,
    },
    SeedProduct {
        name: "EnerGize Max",
        description: "Sustained energy formula with B-Complex, Iron, and natural adaptogens.",
        price_cents: 3999,
        category: "Energy",
        image: "/products/energize.jpg",
        quantity: 90,
    },
];

impl SeedProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.to_owned(),
            description: self.description.to_owned(),
            price: Some(Decimal::new(self.price_cents, 2)),
            category: self.category.to_owned(),
            image: Some(self.image.to_owned()),
            quantity: Some(self.quantity),
        }
    }
}

/// Insert the sample catalog.
///
/// # Arguments
///
/// * `force` - Insert even when products already exist
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn products(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let existing = repo.inventory_stats().await?.total_products;
    if existing > 0 && !force {
        info!(existing, "Catalog is not empty, skipping (use --force to insert anyway)");
        return Ok(());
    }

    for seed in &CATALOG {
        let product = seed.to_new_product().validate()?;
        let created = repo.create(&product).await?;
        info!(id = %created.id, name = %created.name, "Created product");
    }

    info!(count = CATALOG.len(), "Catalog seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_validates() {
        for seed in &CATALOG {
            assert!(seed.to_new_product().validate().is_ok(), "{}", seed.name);
        }
    }

    #[test]
    fn test_catalog_has_one_out_of_stock_product() {
        let out: Vec<_> = CATALOG.iter().filter(|p| p.quantity == 0).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out.first().map(|p| p.name), Some("VitaWell Complete"));
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }
}
