//! Demo catalog for fresh installs.

use rust_decimal::Decimal;
use tracing::info;

use crate::domain::aggregates::{Category, Product, ProductDetails};
use crate::domain::value_objects::Price;
use crate::store::{Store, StoreError, StoreResult};

struct SeedCategory {
    name: &'static str,
    description: &'static str,
    image: &'static str,
}

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    image: &'static str,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Madhubani Painting",
        description: "Traditional Mithila art with intricate patterns and mythological themes",
        image: "https://images.unsplash.com/photo-1579783902614-a3fb3927b6a5?w=400&h=300&fit=crop",
    },
    SeedCategory {
        name: "Embroidery",
        description: "Hand embroidered wall art, accessories and home decor",
        image: "https://images.unsplash.com/photo-1452860606245-08befc0ff44b?w=400&h=300&fit=crop",
    },
    SeedCategory {
        name: "Hand Accessories",
        description: "Handmade bracelets and bangles",
        image: "https://images.unsplash.com/photo-1611591437281-460bfbe1220a?w=400&h=300&fit=crop",
    },
    SeedCategory {
        name: "Canvas Paintings",
        description: "Acrylic, oil and mixed media paintings on canvas",
        image: "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=400&h=300&fit=crop",
    },
    SeedCategory {
        name: "Home Decor",
        description: "Wall hangings, table runners and other pieces for the home",
        image: "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=400&h=300&fit=crop",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category: "Madhubani Painting",
        name: "Madhubani Fish Painting",
        description: "Twin fish motif on handmade paper, painted with natural colours.",
        price: 1800,
        image: "https://images.unsplash.com/photo-1579783902614-a3fb3927b6a5?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Madhubani Painting",
        name: "Madhubani Peacock Art",
        description: "Peacock in authentic Madhubani style with geometric borders.",
        price: 2200,
        image: "https://images.unsplash.com/photo-1578301978693-85fa9c0320b9?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Embroidery",
        name: "Embroidered Clutch Purse",
        description: "Clutch with dense hand embroidery.",
        price: 850,
        image: "https://images.unsplash.com/photo-1594223274512-ad4803739b7c?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Embroidery",
        name: "Embroidery Hoop Art",
        description: "Floral hoop, ready to hang.",
        price: 650,
        image: "https://images.unsplash.com/photo-1452860606245-08befc0ff44b?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Hand Accessories",
        name: "Embroidered Bracelet Set",
        description: "Three adjustable fabric bracelets with thread embroidery.",
        price: 450,
        image: "https://images.unsplash.com/photo-1611591437281-460bfbe1220a?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Hand Accessories",
        name: "Beaded Bangle",
        description: "Beaded bangle in traditional patterns.",
        price: 350,
        image: "https://images.unsplash.com/photo-1515562141207-7a88fb7ce338?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Canvas Paintings",
        name: "Warli Art Wall Painting",
        description: "Tribal Warli scene of village life, hand painted on canvas.",
        price: 1600,
        image: "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=400&h=300&fit=crop",
    },
    SeedProduct {
        category: "Home Decor",
        name: "Embroidered Table Runner",
        description: "Cotton table runner with traditional embroidery.",
        price: 1200,
        image: "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=400&h=300&fit=crop",
    },
];

/// Inserts the demo catalog unless any category exists. Returns whether it ran.
pub async fn seed_catalog(store: &dyn Store) -> StoreResult<bool> {
    if store.count_categories().await? > 0 {
        info!("Catalog already populated, skipping seed");
        return Ok(false);
    }

    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for seed in CATEGORIES {
        let category = Category::create(seed.name, Some(seed.description.into()), Some(seed.image.into()));
        store.insert_category(&category).await?;
        ids.push((seed.name, category.id));
    }

    for seed in PRODUCTS {
        let category_id = ids
            .iter()
            .find(|(name, _)| *name == seed.category)
            .map(|(_, id)| *id)
            .ok_or_else(|| StoreError::Corrupt(format!("seed product {} has unknown category", seed.name)))?;
        let price = Price::new(Decimal::from(seed.price)).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let product = Product::create(ProductDetails {
            name: seed.name.into(),
            description: seed.description.into(),
            price,
            image: seed.image.into(),
            category_id,
            in_stock: true,
        });
        store.insert_product(&product).await?;
    }

    info!(categories = CATEGORIES.len(), products = PRODUCTS.len(), "Seeded demo catalog");
    Ok(true)
}
