pub mod bivariate;
pub mod descriptive;
pub mod dispersion;
pub mod distribution;
pub mod inference;
pub mod special;
