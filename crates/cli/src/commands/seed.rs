//! Seed the catalog with demo data for local development.
//!
//! Records whose name or slug already exists are skipped, so the command
//! can be re-run against a seeded database.

use rand::Rng;
use rand::seq::IndexedRandom;
use sqlx::PgPool;
use tracing::{info, warn};

use catalog_admin::db::{
    self, BrandRepository, CategoryRepository, CustomerRepository, OrderRepository,
    ProductRepository, RepositoryError,
};
use catalog_admin::models::{
    BrandInput, CategoryInput, OrderInput, OrderItemInput, ProductInput,
};
use catalog_core::{
    BrandId, CategoryId, CustomerId, HexColor, OrderStatus, Price, ProductId, ProductType, Slug,
};

use super::migrate::database_url;

const BRANDS: [(&str, &str); 4] = [
    ("Northwind Outfitters", "#1d4ed8"),
    ("Acme Tools", "#dc2626"),
    ("Lumen Home", "#f59e0b"),
    ("Fjord Audio", "#16a34a"),
];

/// Parent category and its children.
const CATEGORIES: [(&str, &[&str]); 3] = [
    ("Outdoor", &["Tents", "Backpacks"]),
    ("Home", &["Lighting", "Kitchen"]),
    ("Electronics", &["Headphones"]),
];

const CUSTOMERS: [(&str, &str); 4] = [
    ("Ada Lovelace", "ada@example.com"),
    ("Grace Hopper", "grace@example.com"),
    ("Alan Turing", "alan@example.com"),
    ("Katherine Johnson", "katherine@example.com"),
];

const PRODUCTS: [&str; 10] = [
    "Trail Tent 2P",
    "Summit Backpack 40L",
    "Desk Lamp Arc",
    "Chef Knife 8in",
    "Studio Headphones",
    "Camp Stove Mini",
    "Pendant Light Globe",
    "Cast Iron Skillet",
    "Wireless Earbuds",
    "Hiking Poles Carbon",
];

/// Counts of inserted records.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub customers: usize,
    pub brands: usize,
    pub categories: usize,
    pub products: usize,
    pub orders: usize,
}

/// Connect and seed demo data.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails for
/// a reason other than an existing record.
pub async fn demo(orders: usize) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = seed(&pool, orders).await?;

    info!("Seeding complete!");
    info!("  Customers: {}", summary.customers);
    info!("  Brands: {}", summary.brands);
    info!("  Categories: {}", summary.categories);
    info!("  Products: {}", summary.products);
    info!("  Orders: {}", summary.orders);
    Ok(summary)
}

async fn seed(pool: &PgPool, order_count: usize) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut summary = SeedSummary::default();

    let mut customers = Vec::new();
    for (name, email) in CUSTOMERS {
        let customer = CustomerRepository::new(pool).upsert(name, email).await?;
        customers.push(customer.id);
        summary.customers += 1;
    }

    let mut brands = Vec::new();
    for (name, hex) in BRANDS {
        let input = BrandInput {
            name: name.to_string(),
            slug: Slug::from_name(name)?,
            url: format!("https://{}.example.com", Slug::from_name(name)?.as_str()),
            description: Some(format!("{name} demo brand.")),
            is_visible: true,
            primary_hex: Some(HexColor::parse(hex)?),
        };
        if let Some(brand) = skip_existing(name, BrandRepository::new(pool).create(&input).await)? {
            brands.push(brand.id);
            summary.brands += 1;
        }
    }

    let mut categories = Vec::new();
    for (parent, children) in CATEGORIES {
        let Some(parent) = skip_existing(
            parent,
            CategoryRepository::new(pool)
                .create(&category_input(parent, None)?)
                .await,
        )?
        else {
            continue;
        };
        categories.push(parent.id);
        summary.categories += 1;
        for child in children {
            let input = category_input(child, Some(parent.id))?;
            if let Some(child) =
                skip_existing(child, CategoryRepository::new(pool).create(&input).await)?
            {
                categories.push(child.id);
                summary.categories += 1;
            }
        }
    }

    let mut products = Vec::new();
    if !brands.is_empty() {
        for (index, name) in PRODUCTS.iter().enumerate() {
            let input = product_input(name, index, &brands, &categories)?;
            if let Some(product) =
                skip_existing(name, ProductRepository::new(pool).create(&input).await)?
            {
                products.push((product.id, product.price));
                summary.products += 1;
            }
        }
    }

    if !products.is_empty() && !customers.is_empty() {
        for _ in 0..order_count {
            let input = order_input(&customers, &products)?;
            OrderRepository::new(pool).create(&input).await?;
            summary.orders += 1;
        }
    }

    Ok(summary)
}

/// Treat a unique violation as "already seeded".
fn skip_existing<T>(
    name: &str,
    result: Result<T, RepositoryError>,
) -> Result<Option<T>, RepositoryError> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(RepositoryError::Conflict { constraint }) => {
            warn!(%name, %constraint, "Skipping existing record");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn category_input(
    name: &str,
    parent_id: Option<CategoryId>,
) -> Result<CategoryInput, Box<dyn std::error::Error>> {
    Ok(CategoryInput {
        parent_id,
        name: name.to_string(),
        slug: Slug::from_name(name)?,
        description: None,
        is_visible: true,
    })
}

fn product_input(
    name: &str,
    index: usize,
    brands: &[BrandId],
    categories: &[CategoryId],
) -> Result<ProductInput, Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    let brand_id = *brands.choose(&mut rng).ok_or("no brands to attach products to")?;
    let cents: u32 = rng.random_range(999..=49_999);
    let category_ids = categories.choose(&mut rng).copied().into_iter().collect();
    Ok(ProductInput {
        brand_id,
        name: name.to_string(),
        slug: Slug::from_name(name)?,
        sku: format!("SKU-{:04}", index + 1),
        image: None,
        description: Some(format!("Demo listing for {name}.")),
        quantity: rng.random_range(0..=250),
        price: Price::parse(&format!("{}.{:02}", cents / 100, cents % 100))?,
        is_visible: true,
        is_featured: index % 4 == 0,
        product_type: Some(if index % 3 == 0 {
            ProductType::Downloadable
        } else {
            ProductType::Deliverable
        }),
        published_at: Some(chrono::Utc::now().date_naive()),
        category_ids,
    })
}

fn order_input(
    customers: &[CustomerId],
    products: &[(ProductId, Price)],
) -> Result<OrderInput, Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    let customer_id = *customers.choose(&mut rng).ok_or("no customers to order")?;
    let status = *OrderStatus::ALL
        .choose(&mut rng)
        .ok_or("no order statuses")?;
    let line_count = rng.random_range(1..=3);
    let picked: Vec<(ProductId, Price)> = products
        .choose_multiple(&mut rng, line_count)
        .copied()
        .collect();
    let items = picked
        .into_iter()
        .map(|(product_id, unit_price)| OrderItemInput {
            id: None,
            product_id,
            quantity: rng.random_range(1..=4),
            unit_price,
        })
        .collect();
    Ok(OrderInput {
        customer_id,
        number: format!("OR-{}", rng.random_range(100_000..=999_999)),
        status,
        shipping_price: Price::parse(if rng.random_bool(0.5) { "0" } else { "9.95" })?,
        notes: None,
        items,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_existing_swallows_conflicts_only() {
        let conflict: Result<i32, RepositoryError> = Err(RepositoryError::Conflict {
            constraint: "brands_slug_key".to_string(),
        });
        assert_eq!(skip_existing("Acme", conflict).unwrap(), None);
        assert_eq!(skip_existing("Acme", Ok(3)).unwrap(), Some(3));
        assert!(skip_existing::<i32>("Acme", Err(RepositoryError::NotFound)).is_err());
    }

    #[test]
    fn test_order_input_uses_product_prices() {
        let price = Price::parse("12.50").unwrap();
        let order = order_input(&[CustomerId::new(1)], &[(ProductId::new(7), price)]).unwrap();
        assert!(order.number.starts_with("OR-"));
        assert_eq!(order.items.len(), 1);
        assert!(order.items.iter().all(|i| i.unit_price == price && i.quantity >= 1));
    }

    #[test]
    fn test_category_input_derives_slug() {
        let input = category_input("Home Office", None).unwrap();
        assert_eq!(input.slug.as_str(), "home-office");
    }
}
