// Registration of every core-full kind
use super::flate::{self, Format, FLATE};
use super::lzw::{self, LZW};
use super::snappy::{self, SNAPPY};
use crate::io::register_endpoints;
use streamcast_core::pipeline::{register_builtin, Registry};

/// Register the core combinators, every endpoint and every codec stage
pub fn register_all(registry: &mut Registry) {
    register_builtin(registry);
    register_endpoints(registry);
    register_stages(registry);
}

/// Register every codec kind as both decoder and encoder
pub fn register_stages(registry: &mut Registry) {
    for format in Format::ALL {
        registry.register_decoder(format.kind(), move |_, inner| {
            flate::wrap_decoder(format, inner)
        });
        registry.register_encoder(format.kind(), move |spec, inner| {
            flate::wrap_encoder(format, spec, inner)
        });
    }
    registry.register_decoder(FLATE, |_, inner| flate::wrap_decoder(Format::Deflate, inner));
    registry.register_encoder(FLATE, |spec, inner| {
        flate::wrap_encoder(Format::Deflate, spec, inner)
    });

    registry.register_decoder(LZW, |_, inner| lzw::wrap_decoder(inner));
    registry.register_encoder(LZW, |_, inner| lzw::wrap_encoder(inner));

    registry.register_decoder(SNAPPY, |_, inner| snappy::wrap_decoder(inner));
    registry.register_encoder(SNAPPY, |_, inner| snappy::wrap_encoder(inner));
}
