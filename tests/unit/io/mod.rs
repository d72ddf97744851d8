mod configuration;
mod image;
