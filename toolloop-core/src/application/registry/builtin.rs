//! Built-in toolsets served by [`LocalProvider`].

use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

use super::local::LocalProvider;

/// Arithmetic and product catalog tools in one provider.
pub fn builtin_provider() -> LocalProvider {
    register_catalog(register_arithmetic(LocalProvider::new("builtin")), Catalog::seeded())
}

/// `add`, `subtract`, `multiply` and `divide` over two integers.
pub fn register_arithmetic(provider: LocalProvider) -> LocalProvider {
    provider
        .register("add", "Adds two numbers a, b", pair_schema(), |args| async move {
            checked(&args, i64::checked_add)
        })
        .register("subtract", "Subtracts b from a", pair_schema(), |args| async move {
            checked(&args, i64::checked_sub)
        })
        .register(
            "multiply",
            "Multiplies two numbers a, b",
            pair_schema(),
            |args| async move { checked(&args, i64::checked_mul) },
        )
        .register("divide", "Divides a by b", pair_schema(), |args| async move {
            divide(&args)
        })
}

/// `obtain_product_from_db` and `create_product` over an in-memory catalog.
pub fn register_catalog(provider: LocalProvider, catalog: Catalog) -> LocalProvider {
    let lookup = catalog.clone();
    provider
        .register(
            "obtain_product_from_db",
            "Get a product by ID from the DB.",
            json!({
                "type": "object",
                "properties": {"product_id": {"type": "integer"}},
                "required": ["product_id"]
            }),
            move |args| {
                let catalog = lookup.clone();
                async move { catalog.lookup(&args) }
            },
        )
        .register(
            "create_product",
            "Create a new product in the catalog.\nReturns the stored record with its id.",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "price": {"type": "number"},
                    "category": {"type": "string"},
                    "description": {"anyOf": [{"type": "string"}, {"type": "null"}]}
                },
                "required": ["name", "price", "category"]
            }),
            move |args| {
                let catalog = catalog.clone();
                async move { catalog.create(&args) }
            },
        )
}

/// Shared, mutable product records keyed by id.
#[derive(Clone, Default)]
pub struct Catalog {
    products: Arc<Mutex<Vec<Value>>>,
}

impl Catalog {
    pub fn seeded() -> Self {
        let products = vec![
            product(1, "Laptop", 999.99, "Electronics", Some("14-inch ultrabook")),
            product(2, "Coffee Mug", 12.5, "Kitchen", Some("Ceramic, 350ml")),
            product(3, "Notebook", 4.25, "Stationery", None),
        ];
        Self {
            products: Arc::new(Mutex::new(products)),
        }
    }

    pub fn get(&self, id: i64) -> Option<Value> {
        let products = self.products.lock().ok()?;
        products
            .iter()
            .find(|record| record["id"].as_i64() == Some(id))
            .cloned()
    }

    fn lookup(&self, args: &Map<String, Value>) -> Result<Value, String> {
        let id = integer_arg(args, "product_id")?;
        self.get(id)
            .ok_or_else(|| format!("NotFound: no product with id {id}"))
    }

    fn create(&self, args: &Map<String, Value>) -> Result<Value, String> {
        let name = string_arg(args, "name")?;
        let category = string_arg(args, "category")?;
        let price = args
            .get("price")
            .and_then(Value::as_f64)
            .ok_or_else(|| "price must be a number".to_string())?;
        let description = args.get("description").and_then(Value::as_str);

        let mut products = self
            .products
            .lock()
            .map_err(|_| "catalog is unavailable".to_string())?;
        let id = products
            .iter()
            .filter_map(|record| record["id"].as_i64())
            .max()
            .unwrap_or(0)
            + 1;
        let record = product(id, &name, price, &category, description);
        products.push(record.clone());
        Ok(record)
    }
}

fn product(id: i64, name: &str, price: f64, category: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "category": category,
        "description": description,
    })
}

fn pair_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "integer"}
        },
        "required": ["a", "b"]
    })
}

fn checked(args: &Map<String, Value>, op: fn(i64, i64) -> Option<i64>) -> Result<Value, String> {
    let (a, b) = integer_pair(args)?;
    op(a, b)
        .map(Value::from)
        .ok_or_else(|| "integer overflow".to_string())
}

fn divide(args: &Map<String, Value>) -> Result<Value, String> {
    let (a, b) = integer_pair(args)?;
    if b == 0 {
        return Err("Cannot divide by zero".to_string());
    }
    Ok(json!(a as f64 / b as f64))
}

fn integer_pair(args: &Map<String, Value>) -> Result<(i64, i64), String> {
    Ok((integer_arg(args, "a")?, integer_arg(args, "b")?))
}

fn integer_arg(args: &Map<String, Value>, name: &str) -> Result<i64, String> {
    match args.get(name) {
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| format!("{name} must be an integer")),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| format!("{name} must be an integer")),
        Some(_) => Err(format!("{name} must be an integer")),
        None => Err(format!("missing required argument '{name}'")),
    }
}

fn string_arg(args: &Map<String, Value>, name: &str) -> Result<String, String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("missing required argument '{name}'"))
}
