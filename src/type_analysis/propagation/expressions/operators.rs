// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod binary;
mod unary;
