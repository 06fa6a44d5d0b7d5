use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;
use standout_tree::{
    argument, literal, ArgumentCommandNode, Command, CommandContext, CommandContextBuilder,
    CommandNode, CommandSyntaxError, IntegerArgumentType, LiteralCommandNode, RedirectModifier,
    RootCommandNode, SourceMapper, StringRange, SuggestionProvider, SuggestionsBuilder,
    SuggestionsFuture, TreeError, WordArgumentType,
};

fn int_to_string() -> SourceMapper<i32, String> {
    SourceMapper::new(
        |s: &String| s.parse::<i32>().unwrap_or_default(),
        |n: &i32| n.to_string(),
    )
}

/// A context over the remapped tree whose path is `nodes`, one word each.
fn context_through(
    root: &RootCommandNode<String>,
    source: &str,
    nodes: &[CommandNode<String>],
) -> CommandContext<String> {
    let mut builder = CommandContextBuilder::new(root.clone(), source.to_string(), 0);
    let mut cursor = 0;
    let mut input = String::new();
    for node in nodes {
        if !input.is_empty() {
            input.push(' ');
            cursor += 1;
        }
        input.push_str(node.name());
        let range = StringRange::between(cursor, cursor + node.name().len());
        builder = builder.with_node(node.clone(), range);
        cursor += node.name().len();
    }
    let command = nodes.last().and_then(|node| node.command());
    builder.with_command(command).build(&input)
}

#[test]
fn test_single_literal() {
    let root = RootCommandNode::<i32>::new();
    let foo = literal("foo")
        .executes(|_: &CommandContext<i32>| Ok(7))
        .build()
        .unwrap();
    root.add_child(foo.clone()).unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let remapped_foo = remapped_root.child("foo").unwrap();

    let ctx = context_through(&remapped_root, "0", &[remapped_foo.clone()]);
    assert_eq!(ctx.command().unwrap().run(&ctx).unwrap(), 7);

    let original = mapper
        .original_literal(remapped_foo.as_literal().unwrap())
        .unwrap();
    assert!(original.ptr_eq(&foo));
    assert!(mapper.original_root(&remapped_root).unwrap().ptr_eq(&root));
}

#[test]
fn test_shared_child() {
    let root = RootCommandNode::<i32>::new();
    let shared = literal::<i32>("c").build().unwrap();
    root.add_child(
        argument("x", IntegerArgumentType::new())
            .then(shared.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    root.add_child(argument("y", WordArgumentType).then(shared.clone()).build().unwrap())
        .unwrap();

    let mapper = int_to_string();
    let remapped = root.map_source(&mapper);
    let under_x = remapped.child("x").unwrap().child("c").unwrap();
    let under_y = remapped.child("y").unwrap().child("c").unwrap();

    assert!(under_x.ptr_eq(&under_y));
    assert!(mapper
        .original_node(&under_x)
        .unwrap()
        .ptr_eq(&CommandNode::from(shared)));
}

#[test]
fn test_redirect_cycle() {
    let hops = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hops);
    let mapper = SourceMapper::new(
        move |s: &String| {
            counter.set(counter.get() + 1);
            s.parse::<i32>().unwrap_or_default()
        },
        |n: &i32| n.to_string(),
    );

    let root = RootCommandNode::<i32>::new();
    let a = literal("a")
        .executes(|ctx: &CommandContext<i32>| Ok(*ctx.source()))
        .build()
        .unwrap();
    let b = literal("b").redirect(a.clone()).build().unwrap();
    a.add_child(b.clone()).unwrap();
    root.add_child(a.clone()).unwrap();

    let remapped_root = root.map_source(&mapper);
    let remapped_a = remapped_root.child("a").unwrap();
    let remapped_b = remapped_a.child("b").unwrap();
    assert!(remapped_b.redirect().unwrap().ptr_eq(&remapped_a));
    assert!(remapped_b.redirect_modifier().is_none());
    assert_eq!(hops.get(), 0);

    // "a b a": the redirect at b continues parsing at a in a child context.
    let after_redirect = CommandContextBuilder::new(remapped_root.clone(), "3".to_string(), 4)
        .with_node(remapped_a.clone(), StringRange::between(4, 5))
        .with_command(remapped_a.command());
    let chain = CommandContextBuilder::new(remapped_root.clone(), "3".to_string(), 0)
        .with_node(remapped_a.clone(), StringRange::between(0, 1))
        .with_node(remapped_b.clone(), StringRange::between(2, 3))
        .with_child(after_redirect)
        .build("a b a");

    let rebound = mapper.original_context(&chain).unwrap();
    assert_eq!(hops.get(), 2);
    assert_eq!(*rebound.source(), 3);
    assert!(rebound.nodes()[0].node().ptr_eq(&CommandNode::from(a.clone())));
    assert!(rebound.nodes()[1].node().ptr_eq(&CommandNode::from(b)));

    let last = rebound.last_child();
    assert!(last.nodes()[0].node().ptr_eq(&CommandNode::from(a)));
    assert_eq!(last.command().unwrap().run(last).unwrap(), 3);
}

#[test]
fn test_modifier_mapping() {
    let mapper: SourceMapper<String, String> = SourceMapper::new(
        |s: &String| s.strip_prefix("v=").unwrap_or(s).to_string(),
        |s: &String| format!("v={}", s),
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let modifier = RedirectModifier::new(move |ctx: &CommandContext<String>| {
        record.borrow_mut().push(ctx.source().clone());
        Ok(vec!["s1".to_string(), "s2".to_string()])
    });

    let root = RootCommandNode::<String>::new();
    let each = literal("each").fork(root.clone(), modifier.clone()).build().unwrap();
    root.add_child(each).unwrap();

    let remapped_root = root.map_source(&mapper);
    let remapped_each = remapped_root.child("each").unwrap();
    let remapped_modifier = remapped_each.redirect_modifier().unwrap();
    assert!(remapped_each.is_fork());
    assert!(remapped_each.redirect().unwrap().ptr_eq(&remapped_root.clone().into()));
    assert!(remapped_modifier.ptr_eq(&modifier.map_source(&mapper)));

    let ctx = context_through(&remapped_root, "v=origin", &[remapped_each]);
    assert!(ctx.is_forked());
    assert_eq!(remapped_modifier.apply(&ctx).unwrap(), vec!["v=s1", "v=s2"]);
    assert_eq!(*seen.borrow(), vec!["origin"]);
}

#[test]
fn test_suggestion_passthrough() {
    let seen: Rc<RefCell<Option<(i32, usize)>>> = Rc::new(RefCell::new(None));
    let record = Rc::clone(&seen);
    let provider = SuggestionProvider::new(
        move |ctx: &CommandContext<i32>, builder: &mut SuggestionsBuilder| {
            let address = builder as *const SuggestionsBuilder as usize;
            *record.borrow_mut() = Some((*ctx.source(), address));
            Ok(builder.suggest("12").suggest("120").build_future())
        },
    );

    let root = RootCommandNode::<i32>::new();
    let amount: ArgumentCommandNode<i32> = argument("amount", IntegerArgumentType::new())
        .suggests(provider.clone())
        .build()
        .unwrap();
    root.add_child(amount.clone()).unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let remapped_amount = remapped_root.child("amount").unwrap();

    let ctx = CommandContextBuilder::new(remapped_root.clone(), "41".to_string(), 0).build("1");
    let mut builder = SuggestionsBuilder::new("1", 0);
    let passed = &builder as *const SuggestionsBuilder as usize;
    let remapped_suggestions =
        block_on(remapped_amount.list_suggestions(&ctx, &mut builder).unwrap()).unwrap();

    assert_eq!(*seen.borrow(), Some((41, passed)));

    let original_ctx = CommandContextBuilder::new(root.clone(), 41, 0).build("1");
    let mut original_builder = SuggestionsBuilder::new("1", 0);
    let original_suggestions =
        block_on(amount.list_suggestions(&original_ctx, &mut original_builder).unwrap()).unwrap();
    assert_eq!(remapped_suggestions, original_suggestions);

    let remapped_provider = remapped_amount.as_argument().unwrap().custom_suggestions().unwrap();
    assert!(mapper.original_suggestions(remapped_provider).unwrap().ptr_eq(&provider));
}

#[test]
fn test_suggestion_failures_pass_through() {
    let provider = SuggestionProvider::new(|_: &CommandContext<i32>, _: &mut SuggestionsBuilder| {
        Err(TreeError::invalid_argument("no completions"))
    });
    let root = RootCommandNode::<i32>::new();
    root.add_child(argument("n", IntegerArgumentType::new()).suggests(provider).build().unwrap())
        .unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let ctx = CommandContextBuilder::new(remapped_root.clone(), "0".to_string(), 0).build("");
    let mut builder = SuggestionsBuilder::new("", 0);
    let result = remapped_root
        .child("n")
        .unwrap()
        .list_suggestions(&ctx, &mut builder);
    assert!(matches!(result, Err(TreeError::InvalidArgument(_))));
}

#[test]
fn test_misuse_detection() {
    let mapper = int_to_string();
    let foreign: ArgumentCommandNode<String> =
        argument("who", WordArgumentType).build().unwrap();

    let err = mapper.original_argument(&foreign).unwrap_err();
    assert_eq!(err.unknown_remap_kind(), Some("argument command node"));
    assert!(err.to_string().contains("argument command node"));
}

#[test]
fn test_rebinding_foreign_context_fails() {
    let mapper = int_to_string();
    let foreign_root = RootCommandNode::<String>::new();
    let ctx = CommandContextBuilder::new(foreign_root, "1".to_string(), 0).build("");

    let err = mapper.original_context(&ctx).unwrap_err();
    assert_eq!(err.unknown_remap_kind(), Some("command node"));
}

#[test]
fn test_remap_is_idempotent() {
    let root = RootCommandNode::<i32>::new();
    root.add_child(literal("x").then(literal("y")).build().unwrap())
        .unwrap();
    let mapper = int_to_string();

    let first = root.map_source(&mapper);
    let second = mapper.remap_root(&root);
    assert!(first.ptr_eq(&second));
    assert!(first
        .child("x")
        .unwrap()
        .ptr_eq(&mapper.remap_node(&root.child("x").unwrap())));
}

#[test]
fn test_twin_shares_argument_type_and_shape() {
    let root = RootCommandNode::<i32>::new();
    let count: ArgumentCommandNode<i32> = argument("count", IntegerArgumentType::between(0, 9))
        .then(literal("times"))
        .then(literal("again"))
        .build()
        .unwrap();
    root.add_child(count.clone()).unwrap();

    let mapper = int_to_string();
    let twin = mapper.remap_argument(&count);
    assert!(Rc::ptr_eq(twin.argument_type(), count.argument_type()));
    assert_eq!(twin.usage_text(), "<count>");

    let names: Vec<String> = twin.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["times", "again"]);

    // A twin reached through the root is the same instance.
    let through_root = root.map_source(&mapper).child("count").unwrap();
    assert!(through_root.as_argument().unwrap().ptr_eq(&twin));
}

#[test]
fn test_behavioural_round_trip() {
    let root = RootCommandNode::<i32>::new();
    let scale: ArgumentCommandNode<i32> = argument("factor", IntegerArgumentType::new())
        .executes(|ctx: &CommandContext<i32>| Ok(ctx.source() * ctx.argument::<i32>("factor")?))
        .build()
        .unwrap();
    root.add_child(literal("scale").then(scale).build().unwrap())
        .unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let remapped_scale = remapped_root.child("scale").unwrap();
    let remapped_factor = remapped_scale.child("factor").unwrap();

    for source in [-3, 0, 6] {
        let input = "scale 4";
        let mut builder =
            CommandContextBuilder::new(remapped_root.clone(), mapper.to_remapped(&source), 0);
        let cursor = remapped_scale.parse(input, 0, &mut builder).unwrap();
        remapped_factor.parse(input, cursor + 1, &mut builder).unwrap();
        let ctx = builder.with_command(remapped_factor.command()).build(input);

        assert_eq!(ctx.command().unwrap().run(&ctx).unwrap(), source * 4);
    }
}

#[test]
fn test_requirement_follows_converter() {
    let root = RootCommandNode::<i32>::new();
    let admin: LiteralCommandNode<i32> = literal("admin")
        .requires(|level: &i32| *level >= 4)
        .build()
        .unwrap();
    root.add_child(admin).unwrap();

    let mapper = int_to_string();
    let remapped = root.map_source(&mapper).child("admin").unwrap();
    assert!(remapped.can_use(&"4".to_string()));
    assert!(!remapped.can_use(&"3".to_string()));
}

#[test]
fn test_dropped_twin_is_retained() {
    let node: LiteralCommandNode<i32> = literal("kept").build().unwrap();
    let mapper = int_to_string();

    let first = mapper.remap_literal(&node);
    first
        .add_child(literal::<String>("marker").build().unwrap())
        .unwrap();
    drop(first);

    let again = mapper.remap_literal(&node);
    assert!(again.child("marker").is_some());
    assert!(mapper.original_literal(&again).unwrap().ptr_eq(&node));
    assert_eq!(mapper.cached_len(), 1);
}

#[test]
fn test_remapped_callbacks_are_retained() {
    let mapper = int_to_string();
    let command = Command::new(|ctx: &CommandContext<i32>| Ok(*ctx.source()));
    let modifier = RedirectModifier::single(|ctx: &CommandContext<i32>| Ok(*ctx.source()));

    let first = format!("{:?}", mapper.remap_command(&command));
    let second = format!("{:?}", mapper.remap_command(&command));
    assert_eq!(first, second);

    let first = format!("{:?}", mapper.remap_modifier(&modifier));
    let second = format!("{:?}", mapper.remap_modifier(&modifier));
    assert_eq!(first, second);
}

#[test]
fn test_modifier_failure_passes_through() {
    let root = RootCommandNode::<i32>::new();
    let modifier = RedirectModifier::new(|_: &CommandContext<i32>| {
        Err(CommandSyntaxError::new("no targets").into())
    });
    root.add_child(literal("each").fork(root.clone(), modifier).build().unwrap())
        .unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let each = remapped_root.child("each").unwrap();
    let ctx = context_through(&remapped_root, "1", &[each.clone()]);

    let err = each.redirect_modifier().unwrap().apply(&ctx).unwrap_err();
    assert_eq!(err.as_syntax().unwrap().message(), "no targets");
}

#[test]
fn test_deferred_suggestion_failure_passes_through() {
    let provider = SuggestionProvider::new(|_: &CommandContext<i32>, _: &mut SuggestionsBuilder| {
        let later: SuggestionsFuture =
            Box::pin(async { Err(TreeError::invalid_argument("later")) });
        Ok(later)
    });
    let root = RootCommandNode::<i32>::new();
    root.add_child(argument("n", IntegerArgumentType::new()).suggests(provider).build().unwrap())
        .unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let ctx = CommandContextBuilder::new(remapped_root.clone(), "0".to_string(), 0).build("");
    let mut builder = SuggestionsBuilder::new("", 0);
    let future = remapped_root
        .child("n")
        .unwrap()
        .list_suggestions(&ctx, &mut builder)
        .unwrap();

    let err = block_on(future).unwrap_err();
    assert_eq!(err.to_string(), "invalid argument: later");
}

#[test]
fn test_rebinding_keeps_parse_record() {
    let root = RootCommandNode::<i32>::new();
    let same_source = RedirectModifier::single(|ctx: &CommandContext<i32>| Ok(*ctx.source()));
    let each = literal("each")
        .fork(root.clone(), same_source)
        .build()
        .unwrap();
    root.add_child(
        literal("give")
            .then(argument("amount", IntegerArgumentType::new()).then(each))
            .build()
            .unwrap(),
    )
    .unwrap();

    let mapper = int_to_string();
    let remapped_root = root.map_source(&mapper);
    let give = remapped_root.child("give").unwrap();
    let amount = give.child("amount").unwrap();
    let each = amount.child("each").unwrap();

    let input = "give 25 each";
    let mut builder = CommandContextBuilder::new(remapped_root.clone(), "9".to_string(), 0);
    let cursor = give.parse(input, 0, &mut builder).unwrap();
    let cursor = amount.parse(input, cursor + 1, &mut builder).unwrap();
    each.parse(input, cursor + 1, &mut builder).unwrap();
    let ctx = builder.build(input);

    let rebound = mapper.original_context(&ctx).unwrap();
    assert_eq!(*rebound.source(), 9);
    assert_eq!(rebound.input(), ctx.input());
    assert_eq!(rebound.range(), ctx.range());
    assert_eq!(rebound.range(), StringRange::between(0, 12));
    assert_eq!(rebound.is_forked(), ctx.is_forked());
    assert!(rebound.is_forked());

    assert_eq!(rebound.nodes().len(), ctx.nodes().len());
    for (original, remapped) in rebound.nodes().iter().zip(ctx.nodes()) {
        assert_eq!(original.range(), remapped.range());
        assert!(original.node().ptr_eq(&mapper.original_node(remapped.node()).unwrap()));
    }

    let names: Vec<&String> = rebound.arguments().keys().collect();
    assert_eq!(names, vec!["amount"]);
    assert_eq!(
        rebound.arguments()["amount"].range(),
        ctx.arguments()["amount"].range()
    );
    assert_eq!(rebound.argument::<i32>("amount").unwrap(), 25);
    assert_eq!(ctx.argument::<i32>("amount").unwrap(), 25);
}
