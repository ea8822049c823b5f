//! # hclref - references of configuration bodies
//!
//! Finds out which variables a configuration body depends on, given the schema of the block it belongs to.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `hclref` works internally.
//!
//! ### Schemas
//!
//! A provider describes each managed resource and data source type with a [schema::Block]: attributes and nested
//! block types, each nested block type with a [schema::NestingMode]. [resolve::resolve_schema] asks a
//! [provider::Provider] for that schema. Old providers cannot describe their types; for those the schema is absent
//! and there is nothing to do.
//!
//! ### Decode specifications
//!
//! A schema says what a body may contain, a [spec::DecodeSpec] says how to read it. [schema::Block::decoder_spec]
//! compiles one into the other:
//!
//! | schema                        | rule                                   |
//! |-------------------------------|----------------------------------------|
//! | attribute                     | [spec::Rule::Attr]                     |
//! | block type, nesting `single`  | [spec::Rule::Block]                    |
//! | block type, nesting `list`    | [spec::Rule::BlockList]                |
//! | block type, nesting `set`     | [spec::Rule::BlockSet]                 |
//! | block type, nesting `map`     | [spec::Rule::BlockMap] (label `key`)   |
//!
//! ### Finding traversals
//!
//! Configuration files are loaded into [documents::Documents]. The body is walked the way a decoder would walk
//! it (see [visit]): only names the decode spec knows about are looked at, and every [hcl::Traversal] rooted at a
//! variable is collected. Names bound by `for` expressions are local and left out.
//!
//! ```hcl
//! instance_type = var.size                           # var.size
//! tags          = { Name = "${var.prefix}-web" }     # var.prefix
//! subnet_id     = aws_subnet.main[0].id              # aws_subnet.main[0].id
//! names         = [for s in var.servers : s.name]    # var.servers
//! ```
//!
//! ### Lowering
//!
//! [lower::lower_traversals] turns each traversal into a canonical dotted key (`aws_subnet.main.0.id`) and
//! classifies the key as a [variable::InterpolatedVariable]. Keys are deduplicated. Traversals that cannot be
//! represented (fractional indices, unclassifiable names) are skipped and reported, never treated as errors.
//!
//! ### Output
//!
//! [lower::Lowering] and [spec::DecodeSpec] serialize via [serde]; the `hclref` binary prints them as YAML or JSON.
//!
pub mod documents;
pub mod format;
pub mod lower;
pub mod provider;
pub mod resolve;
pub mod schema;
pub mod spec;
pub mod variable;
pub mod visit;
