//! Input data model: pieces to cut and stock blocks to cut them from.
//!
//! All dimensions share one caller-chosen unit; nothing here converts units.

use crate::geometry::{self, Vec3};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
fn default_quantity() -> usize {
    1
}

/// A required cuboid with a quantity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece {
    /// Unique identifier.
    pub id: String,
    /// Length (x extent in the identity rotation).
    pub length: f64,
    /// Width (y extent in the identity rotation).
    pub width: f64,
    /// Height (z extent in the identity rotation).
    pub height: f64,
    /// Number of copies required.
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub quantity: usize,
    /// Display label.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    /// Display color, passed through untouched.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub color: Option<String>,
}

impl Piece {
    /// Creates a piece with quantity 1, labelled with its id.
    pub fn new(id: impl Into<String>, length: f64, width: f64, height: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            length,
            width,
            height,
            quantity: 1,
            color: None,
        }
    }

    /// Sets the required quantity.
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Dimensions as (length, width, height).
    pub fn dims(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }

    /// Volume of one copy.
    pub fn volume(&self) -> f64 {
        geometry::volume(&self.dims())
    }

    /// Footprint area (length × width).
    pub fn footprint(&self) -> f64 {
        self.length * self.width
    }

    /// Validates dimensions and quantity.
    pub fn validate(&self) -> Result<()> {
        validate_dims("piece", &self.id, &self.dims())?;
        if self.quantity == 0 {
            return Err(Error::invalid(format!(
                "piece '{}' has zero quantity",
                self.id
            )));
        }
        Ok(())
    }
}

/// Raw material cuboid with an available quantity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockBlock {
    /// Unique identifier.
    pub id: String,
    /// Length (x extent).
    pub length: f64,
    /// Width (y extent).
    pub width: f64,
    /// Height (z extent).
    pub height: f64,
    /// Number of blocks available.
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub quantity: usize,
    /// Display label.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    /// Unit price, passed through into the total cost.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub price: Option<f64>,
}

impl StockBlock {
    /// Creates a stock block with quantity 1, labelled with its id.
    pub fn new(id: impl Into<String>, length: f64, width: f64, height: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            length,
            width,
            height,
            quantity: 1,
            price: None,
        }
    }

    /// Sets the available quantity.
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the unit price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Dimensions as (length, width, height).
    pub fn dims(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }

    /// Volume of one block.
    pub fn volume(&self) -> f64 {
        geometry::volume(&self.dims())
    }

    /// Validates dimensions, quantity and price.
    pub fn validate(&self) -> Result<()> {
        validate_dims("stock", &self.id, &self.dims())?;
        if self.quantity == 0 {
            return Err(Error::invalid(format!(
                "stock '{}' has zero quantity",
                self.id
            )));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::invalid(format!(
                    "stock '{}' has invalid price {}",
                    self.id, price
                )));
            }
        }
        Ok(())
    }
}

fn validate_dims(kind: &str, id: &str, dims: &Vec3) -> Result<()> {
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return Err(Error::invalid(format!(
            "{} '{}' has non-positive dimensions {}x{}x{}",
            kind, id, dims.x, dims.y, dims.z
        )));
    }
    Ok(())
}
