// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod options;
mod resolver;

pub use options::{OptionsError, TypeResolverOptions};
pub use resolver::{LazyCopy, TypeResolver};
